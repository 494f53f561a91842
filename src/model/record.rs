//! Per-file extraction results.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::figure::{Caption, ImageRef};
use crate::text::CitationMatch;

/// Extraction stage a degradation was recorded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Opening and parsing the file
    Open,
    /// Title detection
    Title,
    /// Plain-text extraction (captions)
    Text,
    /// Image extraction as a whole (e.g. the output directory)
    Images,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Open => "open",
            Stage::Title => "title",
            Stage::Text => "text",
            Stage::Images => "images",
        };
        f.write_str(name)
    }
}

/// A non-fatal failure of one stage for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Degradation {
    pub stage: Stage,
    pub message: String,
}

impl Degradation {
    /// Record a failure in `stage`.
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
        }
    }
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.stage, self.message)
    }
}

/// Whether every stage of a record succeeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordStatus {
    Complete,
    Degraded,
}

/// Everything extracted from one input file.
///
/// Captions and images are independent ordered lists; the Nth caption is
/// shown with the Nth image.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    /// The input file
    pub path: PathBuf,

    /// Detected title
    pub title: Option<String>,

    /// Citation chosen for the title
    pub citation: CitationMatch,

    /// Captions in text order
    pub captions: Vec<Caption>,

    /// Saved images in (page, index) order
    pub images: Vec<ImageRef>,

    /// Stages that failed
    pub degradations: Vec<Degradation>,
}

impl DocumentRecord {
    /// An empty record for `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            title: None,
            citation: CitationMatch::none(),
            captions: Vec::new(),
            images: Vec::new(),
            degradations: Vec::new(),
        }
    }

    /// Input file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name with extension (`paper.pdf`).
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File name without extension (`paper`).
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Number of output positions: the longer of the two lists.
    pub fn pair_count(&self) -> usize {
        self.images.len().max(self.captions.len())
    }

    /// The text shown before every pair, and whether it is a matched citation.
    pub fn display_label(&self) -> (String, bool) {
        match &self.citation.citation {
            Some(citation) => (citation.clone(), true),
            None => (self.stem(), false),
        }
    }

    /// Record a failed stage.
    pub fn degrade(&mut self, stage: Stage, message: impl Into<String>) {
        let degradation = Degradation::new(stage, message);
        log::warn!("{}: {}", self.path.display(), degradation);
        self.degradations.push(degradation);
    }

    /// Complete, or degraded if any stage failed.
    pub fn status(&self) -> RecordStatus {
        if self.degradations.is_empty() {
            RecordStatus::Complete
        } else {
            RecordStatus::Degraded
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_complete() {
        let record = DocumentRecord::new("pdfs/a/paper.pdf");
        assert_eq!(record.status(), RecordStatus::Complete);
        assert_eq!(record.file_name(), "paper.pdf");
        assert_eq!(record.stem(), "paper");
        assert_eq!(record.pair_count(), 0);
    }

    #[test]
    fn test_degrade_changes_status() {
        let mut record = DocumentRecord::new("paper.pdf");
        record.degrade(Stage::Text, "no text layer");
        assert_eq!(record.status(), RecordStatus::Degraded);
        assert_eq!(record.degradations[0].to_string(), "text: no text layer");
    }

    #[test]
    fn test_pair_count_is_longer_list() {
        let mut record = DocumentRecord::new("paper.pdf");
        record.captions.push(Caption::new("Figure 1. A"));
        for index in 1..=3 {
            record.images.push(ImageRef {
                path: PathBuf::from(ImageRef::file_name_for(1, index)),
                page: 1,
                index,
                width: 600,
                height: 600,
            });
        }
        assert_eq!(record.pair_count(), 3);
    }

    #[test]
    fn test_display_label() {
        let mut record = DocumentRecord::new("dir/paper.pdf");
        assert_eq!(record.display_label(), ("paper".to_string(), false));

        record.citation = CitationMatch {
            citation: Some("Smith 2020".to_string()),
            score: 0.9,
        };
        assert_eq!(record.display_label(), ("Smith 2020".to_string(), true));
    }
}
