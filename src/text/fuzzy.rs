//! Longest-matching-block similarity and best-candidate lookup.
//!
//! The ratio is the Ratcliff/Obershelp measure `2·M / (|a| + |b|)`, where
//! `M` counts the characters in all matching blocks found by recursively
//! taking the longest common block and searching on either side of it.

use std::collections::HashMap;

use serde::Serialize;

use super::normalize::normalize_for_match;

/// Second sequences at least this long get popular-character pruning.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a_start..a_start+len] == b[b_start..b_start+len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Sequence comparison over Unicode scalar values.
///
/// Characters that are very frequent in a long `b` ("popular" characters)
/// never seed a match, though matches may still extend across them.
pub struct SequenceMatcher {
    a: Vec<char>,
    b: Vec<char>,
    b2j: HashMap<char, Vec<usize>>,
}

impl SequenceMatcher {
    /// Prepare a comparison of `a` against `b`.
    pub fn new(a: &str, b: &str) -> Self {
        let a: Vec<char> = a.chars().collect();
        let b: Vec<char> = b.chars().collect();

        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Among equally long blocks, the one starting earliest in `a` wins, then
    /// the one starting earliest in `b`.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchBlock {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0usize);

        // j2len[j] = length of the match ending at a[i-1], b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for i in alo..ahi {
            let mut next: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    next.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            j2len = next;
        }

        // Popular characters were left out of b2j; grow across them.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        MatchBlock {
            a_start: best_i,
            b_start: best_j,
            len: best_len,
        }
    }

    /// All matching blocks, ordered by position.
    pub fn matching_blocks(&self) -> Vec<MatchBlock> {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let block = self.find_longest_match(alo, ahi, blo, bhi);
            if block.len == 0 {
                continue;
            }
            if alo < block.a_start && blo < block.b_start {
                pending.push((alo, block.a_start, blo, block.b_start));
            }
            let (a_end, b_end) = (block.a_start + block.len, block.b_start + block.len);
            if a_end < ahi && b_end < bhi {
                pending.push((a_end, ahi, b_end, bhi));
            }
            blocks.push(block);
        }

        blocks.sort_by_key(|m| (m.a_start, m.b_start));
        blocks
    }

    /// Similarity in [0, 1]; 1.0 when both sequences are empty.
    pub fn ratio(&self) -> f64 {
        let total = self.a.len() + self.b.len();
        if total == 0 {
            return 1.0;
        }
        let matches: usize = self.matching_blocks().iter().map(|m| m.len).sum();
        2.0 * matches as f64 / total as f64
    }
}

/// Similarity ratio between two raw strings (no normalization applied).
pub fn similarity(a: &str, b: &str) -> f64 {
    SequenceMatcher::new(a, b).ratio()
}

/// Outcome of matching a title against the citation pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CitationMatch {
    /// The accepted citation, if any candidate reached the threshold.
    pub citation: Option<String>,
    /// Score of the accepted citation; 0.0 when nothing was accepted.
    pub score: f64,
}

impl CitationMatch {
    /// The "no match" result.
    pub fn none() -> Self {
        Self::default()
    }

    /// Whether a citation was accepted.
    pub fn is_matched(&self) -> bool {
        self.citation.is_some()
    }
}

/// Find the candidate most similar to `target` after normalization.
///
/// Only a strictly better score replaces the current best, so the earliest
/// candidate wins ties. Anything below `threshold` is reported as no match.
pub fn best_match<S: AsRef<str>>(target: &str, pool: &[S], threshold: f64) -> CitationMatch {
    if target.trim().is_empty() {
        return CitationMatch::none();
    }
    let target = normalize_for_match(target);
    if target.is_empty() {
        return CitationMatch::none();
    }

    let mut best: Option<&str> = None;
    let mut best_score = 0.0;
    for candidate in pool {
        let candidate = candidate.as_ref();
        let score = similarity(&target, &normalize_for_match(candidate));
        if score > best_score {
            best = Some(candidate);
            best_score = score;
        }
    }

    match best {
        Some(citation) if best_score >= threshold => CitationMatch {
            citation: Some(citation.to_string()),
            score: best_score,
        },
        _ => CitationMatch::none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_ratio_known_values() {
        // 'abcd' vs 'bcde' share 'bcd'
        assert!(approx(similarity("abcd", "bcde"), 0.75));
        assert!(approx(similarity("abc", "abc"), 1.0));
        assert!(approx(similarity("abc", "xyz"), 0.0));
        assert!(approx(similarity("", ""), 1.0));
        assert!(approx(similarity("abc", ""), 0.0));
    }

    #[test]
    fn test_ratio_recurses_on_both_sides() {
        // blocks: 'a' then 'cd' around the unmatched b/x
        let matcher = SequenceMatcher::new("abcd", "axcd");
        let blocks = matcher.matching_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(
            blocks[0],
            MatchBlock {
                a_start: 0,
                b_start: 0,
                len: 1
            }
        );
        assert_eq!(blocks[1].len, 2);
        assert!(approx(matcher.ratio(), 0.75));
    }

    #[test]
    fn test_longest_match_prefers_earliest() {
        let matcher = SequenceMatcher::new(" abcd", "abcd abcd");
        let block = matcher.find_longest_match(0, 5, 0, 9);
        assert_eq!(
            block,
            MatchBlock {
                a_start: 0,
                b_start: 4,
                len: 5
            }
        );
    }

    #[test]
    fn test_popular_characters_do_not_seed_matches() {
        // 'a' makes up the whole of b, so it is popular and can't seed a block;
        // only the extension from the range start picks up a single character
        let b = "a".repeat(200);
        assert!(approx(similarity("a", &b), 2.0 / 201.0));
        assert!(approx(similarity("ba", &b), 0.0));

        // 'x' is rare and seeds a block that then grows across popular 'a's
        let b = format!("x{}", "a".repeat(199));
        let matcher = SequenceMatcher::new("xaa", &b);
        assert_eq!(matcher.find_longest_match(0, 3, 0, 200).len, 3);
    }

    #[test]
    fn test_identical_string_scores_one() {
        let pool = vec![
            "Unrelated paper on rocks".to_string(),
            "Single-cell atlas of the human retina".to_string(),
        ];
        let result = best_match("Single-cell atlas of the human retina", &pool, 0.55);
        assert_eq!(result.citation.as_deref(), Some(pool[1].as_str()));
        assert!(approx(result.score, 1.0));
    }

    #[test]
    fn test_match_after_normalization() {
        let pool = ["Smith J. (2020). SINGLE-CELL ATLAS: The Human Retina. Cell."];
        let result = best_match("Single cell atlas the human retina", &pool, 0.55);
        assert!(result.is_matched());
        assert!(result.score >= 0.55);
    }

    #[test]
    fn test_never_returns_below_threshold() {
        let pool = ["completely different words here", "another candidate"];
        for threshold in [0.0, 0.3, 0.55, 0.9, 1.0] {
            let result = best_match("retina atlas", &pool, threshold);
            if result.is_matched() {
                assert!(result.score >= threshold);
            } else {
                assert_eq!(result.score, 0.0);
            }
        }
    }

    #[test]
    fn test_empty_target_and_pool() {
        let pool = ["anything"];
        assert_eq!(best_match("", &pool, 0.0), CitationMatch::none());
        assert_eq!(best_match("   ", &pool, 0.0), CitationMatch::none());
        assert_eq!(best_match("...", &pool, 0.0), CitationMatch::none());

        let empty: [&str; 0] = [];
        assert_eq!(best_match("title", &empty, 0.0), CitationMatch::none());
    }

    #[test]
    fn test_first_candidate_wins_ties() {
        let pool = ["Same Title", "same title"];
        let result = best_match("same title", &pool, 0.5);
        assert_eq!(result.citation.as_deref(), Some("Same Title"));
    }
}
