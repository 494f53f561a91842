//! Batch run configuration.

use std::path::{Path, PathBuf};

use crate::extract::{ImageFilter, TitleOptions};
use crate::render::{EmbedOptions, OutputFormat};

/// Default similarity a citation needs to be accepted.
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.55;

/// Everything a batch run needs, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory searched recursively for PDF files
    pub pdf_root: PathBuf,

    /// Citation list, one entry per line
    pub citations_path: PathBuf,

    /// Combined output document
    pub output_path: PathBuf,

    /// Audit CSV; not written when `None`
    pub audit_path: Option<PathBuf>,

    /// Output format; derived from the output extension when `None`
    pub format: Option<OutputFormat>,

    /// Minimum similarity for a citation match
    pub match_threshold: f64,

    /// Which embedded images are kept
    pub image_filter: ImageFilter,

    /// Title detection heuristics
    pub title: TitleOptions,

    /// Figure sizing in the output
    pub embed: EmbedOptions,

    /// Build per-file records on the rayon pool
    pub parallel: bool,
}

impl BatchOptions {
    /// Options for the given input root, citation list and output document.
    pub fn new(
        pdf_root: impl Into<PathBuf>,
        citations_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            pdf_root: pdf_root.into(),
            citations_path: citations_path.into(),
            output_path: output_path.into(),
            audit_path: None,
            format: None,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            image_filter: ImageFilter::default(),
            title: TitleOptions::default(),
            embed: EmbedOptions::default(),
            parallel: false,
        }
    }

    /// Also write the audit CSV to `path`.
    pub fn with_audit(mut self, path: impl Into<PathBuf>) -> Self {
        self.audit_path = Some(path.into());
        self
    }

    /// Force an output format.
    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Set the citation match threshold (clamped to 0..=1).
    pub fn with_match_threshold(mut self, threshold: f64) -> Self {
        self.match_threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Set the image size filter.
    pub fn with_image_filter(mut self, filter: ImageFilter) -> Self {
        self.image_filter = filter;
        self
    }

    /// Set the title detection options.
    pub fn with_title_options(mut self, title: TitleOptions) -> Self {
        self.title = title;
        self
    }

    /// Set the figure sizing options.
    pub fn with_embed(mut self, embed: EmbedOptions) -> Self {
        self.embed = embed;
        self
    }

    /// Enable or disable parallel record building.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The format the output document is written in.
    pub fn output_format(&self) -> OutputFormat {
        self.format
            .unwrap_or_else(|| OutputFormat::from_path(&self.output_path))
    }

    /// Root of the per-file image directories: `<parent>/_images_<stem>`.
    pub fn images_root(&self) -> PathBuf {
        let parent = self.output_path.parent().unwrap_or_else(|| Path::new(""));
        let stem = self
            .output_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        parent.join(format!("_images_{}", stem))
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new(
            "pdfs",
            "Citations.txt",
            "output/All_Figures_Captions.docx",
        )
        .with_audit("output/pdf_to_citation_map.csv")
    }
}
