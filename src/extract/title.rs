//! Document title detection.

use crate::error::Result;
use crate::parser::{PdfSource, SpanExtractor, TextSpan};
use crate::text::collapse_whitespace;

use super::options::TitleOptions;

/// Detect the title of a document.
///
/// The metadata `Title` wins when it is non-blank. Otherwise the largest
/// text on the first page is used, unless it is a front-matter label.
pub fn extract_title(source: &PdfSource, options: &TitleOptions) -> Result<Option<String>> {
    if options.use_metadata {
        if let Some(title) = source.metadata_title() {
            let title = title.trim();
            if !title.is_empty() {
                return Ok(Some(title.to_string()));
            }
        }
    }

    if source.page_count() == 0 {
        return Ok(None);
    }

    let spans = SpanExtractor::new(source).page_spans(1)?;
    Ok(title_from_spans(&spans, options))
}

/// Join the spans set at the largest font size, in drawing order.
pub fn title_from_spans(spans: &[TextSpan], options: &TitleOptions) -> Option<String> {
    let max_size = spans
        .iter()
        .map(|s| s.font_size)
        .fold(f32::NEG_INFINITY, f32::max);
    if !max_size.is_finite() {
        return None;
    }

    let joined: Vec<&str> = spans
        .iter()
        .filter(|s| (s.font_size - max_size).abs() < options.size_tolerance)
        .map(|s| s.text.as_str())
        .collect();
    let candidate = collapse_whitespace(&joined.join(" "));

    if candidate.is_empty() || options.is_rejected(&candidate) {
        return None;
    }
    Some(candidate)
}
