//! Citation list loading.

use std::path::Path;

use crate::error::{Error, Result};
use crate::text::strip_markup;

/// Read a citation list, one entry per line.
///
/// Each line is trimmed and stripped of markup; blank lines are dropped.
/// Order and duplicates are preserved.
pub fn load_citations<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| Error::Citations {
        path: path.to_path_buf(),
        source,
    })?;
    let citations = parse_citations(&content);
    log::info!("Loaded {} citations from {}", citations.len(), path.display());
    Ok(citations)
}

/// Parse citation entries from text.
pub fn parse_citations(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| strip_markup(line.trim()))
        .filter(|line| !line.is_empty())
        .collect()
}
