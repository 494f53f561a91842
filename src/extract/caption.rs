//! Figure caption segmentation over plain document text.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::Caption;

static FIG_ABBREVIATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bFig\.\s*").unwrap());

static CAPTION_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Figure\s+S?\d+[A-Za-z]?(?:\.[A-Za-z])?\s*[.:]").unwrap());

/// Where a caption body stops: the next figure label or a section marker
/// at the start of a line.
static CAPTION_END: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\nFigure\s+S?\d+|\nSTAR★METHODS|\nREFERENCES|\nArticle").unwrap()
});

static TRAILING_BLANKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+\n").unwrap());
static EXCESS_NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());

/// Cut the captions out of a document's full text, in text order.
pub fn extract_captions(text: &str) -> Vec<Caption> {
    let text = FIG_ABBREVIATION.replace_all(text, "Figure ");
    let text = text.as_ref();

    let mut captions = Vec::new();
    let mut pos = 0;
    while let Some(start) = CAPTION_START.find_at(text, pos) {
        let end = CAPTION_END
            .find_at(text, start.end())
            .map(|m| m.start())
            .unwrap_or(text.len());

        let block = tidy(&text[start.start()..end]);
        if !block.is_empty() {
            captions.push(Caption::new(block));
        }
        pos = end;
    }
    captions
}

fn tidy(block: &str) -> String {
    let block = block.trim();
    let block = TRAILING_BLANKS.replace_all(block, "\n");
    EXCESS_NEWLINES.replace_all(&block, "\n\n").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(input: &str) -> Vec<String> {
        extract_captions(input).into_iter().map(|c| c.text).collect()
    }

    #[test]
    fn test_consecutive_captions_split() {
        assert_eq!(
            texts("Figure 1. A cell.\nFigure 2. Another cell."),
            vec!["Figure 1. A cell.", "Figure 2. Another cell."]
        );
    }

    #[test]
    fn test_abbreviation_and_section_marker() {
        assert_eq!(
            texts("Fig. 3: something\nSTAR★METHODS\nKey resources table"),
            vec!["Figure 3: something"]
        );
    }

    #[test]
    fn test_stops_at_references_and_article() {
        assert_eq!(
            texts("Intro.\nFigure 1: Retina.\nREFERENCES\n1. Smith"),
            vec!["Figure 1: Retina."]
        );
        assert_eq!(
            texts("Figure 2. Layout\nArticle\nCell Reports 12"),
            vec!["Figure 2. Layout"]
        );
    }

    #[test]
    fn test_runs_to_end_of_text() {
        assert_eq!(
            texts("See below.\nFigure S4A. Supplementary data   \nsecond line"),
            vec!["Figure S4A. Supplementary data\nsecond line"]
        );
    }

    #[test]
    fn test_inline_reference_is_not_caption() {
        // no period or colon after the number
        assert!(texts("as shown in Figure 2 and Figure 3").is_empty());
    }

    #[test]
    fn test_mid_line_label_does_not_end_caption() {
        assert_eq!(
            texts("Figure 1. Compare with Figure 2. in text\n"),
            vec!["Figure 1. Compare with Figure 2. in text"]
        );
    }

    #[test]
    fn test_blank_lines_collapsed() {
        assert_eq!(
            texts("Figure 5: Top\n\n\n\nBottom"),
            vec!["Figure 5: Top\n\nBottom"]
        );
    }
}
