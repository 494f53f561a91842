//! CSV audit table mapping each input file to its citation.

use std::path::Path;

use serde::Serialize;

use super::ensure_parent;
use crate::error::Result;
use crate::model::DocumentRecord;

const MISSING: &str = "N/A";

/// One line of the audit table; field names are the CSV header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRow {
    pub pdf_path: String,
    pub pdf_title_detected: String,
    pub matched_citation: String,
    pub score: String,
}

impl From<&DocumentRecord> for AuditRow {
    fn from(record: &DocumentRecord) -> Self {
        Self {
            pdf_path: record.path.display().to_string(),
            pdf_title_detected: non_blank(record.title.as_deref()),
            matched_citation: non_blank(record.citation.citation.as_deref()),
            score: format!("{:.2}", record.citation.score),
        }
    }
}

fn non_blank(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => MISSING.to_string(),
    }
}

/// Write the audit table for `records` to `path`.
pub fn write_audit<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = &'a DocumentRecord>,
{
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(AuditRow::from(record))?;
    }
    writer.flush()?;
    log::info!("Wrote {}", path.display());
    Ok(())
}
