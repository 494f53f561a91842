//! Captions and saved images: the two lists a record pairs by position.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static LABEL_SPLIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^(Figure\s+S?\d+[A-Za-z]?(?:\.[A-Za-z])?)\s*([.:].*)$").unwrap()
});

/// A figure caption cut from the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Caption {
    /// Caption text, starting at its figure label
    pub text: String,
}

impl Caption {
    /// Create a caption.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Split into the figure label ("Figure 3") and the rest (": A cell.").
    ///
    /// Returns `None` when the text does not start with a figure label.
    pub fn split_label(&self) -> Option<(&str, &str)> {
        let caps = LABEL_SPLIT.captures(&self.text)?;
        let label = caps.get(1)?.as_str();
        let body = caps.get(2)?.as_str();
        Some((label, body))
    }

    /// The figure label, if the caption has one.
    pub fn label(&self) -> Option<&str> {
        self.split_label().map(|(label, _)| label)
    }
}

impl std::fmt::Display for Caption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// An embedded image that was decoded and saved as PNG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    /// Location of the saved PNG
    pub path: PathBuf,

    /// 1-based page number
    pub page: u32,

    /// 1-based position among all images of the page, before filtering
    pub index: u32,

    /// Width in pixels
    pub width: u32,

    /// Height in pixels
    pub height: u32,
}

impl ImageRef {
    /// File name used when saving an image: `p03_img02.png`.
    pub fn file_name_for(page: u32, index: u32) -> String {
        format!("p{:02}_img{:02}.png", page, index)
    }

    /// The saved file's name, for placeholders and alt text.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| Self::file_name_for(self.page, self.index))
    }

    /// Path of the saved PNG.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
