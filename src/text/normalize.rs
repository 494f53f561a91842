//! Canonical string form for fuzzy comparison.

use once_cell::sync::Lazy;
use regex::Regex;

/// Punctuation runs that separate words but carry no meaning for matching.
static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[_\-–—:,.;/\\()\[\]{}<>|!?"'`~^*+=]+"#).unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Normalize text for fuzzy comparison.
///
/// Lowercases, turns every punctuation run into a single space, collapses
/// whitespace and trims. Applying it twice gives the same result as once.
pub fn normalize_for_match(s: &str) -> String {
    let lowered = s.to_lowercase();
    let spaced = PUNCTUATION.replace_all(&lowered, " ");
    collapse_whitespace(&spaced)
}

/// Collapse every whitespace run to one space and trim both ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}
