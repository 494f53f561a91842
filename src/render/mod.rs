//! Writing the combined figure document and the audit table.
//!
//! The assembler drives a [`Composer`], which appends elements in order and
//! writes the finished document in [`Composer::finish`]. Two formats are
//! provided: DOCX (the default) and Markdown.

mod audit;
mod docx;
mod markdown;
mod options;

use std::path::Path;

pub use audit::{write_audit, AuditRow};
pub use docx::DocxComposer;
pub use markdown::MarkdownComposer;
pub use options::{EmbedOptions, EMU_PER_INCH};

use crate::error::{Error, Result};
use crate::model::{Caption, ImageRef};

/// Sink for the elements of the combined document.
pub trait Composer {
    /// A heading (1 = document title, 2 = per-file heading).
    fn heading(&mut self, text: &str, level: u8);

    /// A plain paragraph.
    fn paragraph(&mut self, text: &str);

    /// The label shown before each figure. Unmatched labels get a marker.
    fn citation_label(&mut self, label: &str, matched: bool);

    /// A centered figure at the given placement.
    fn image(&mut self, image: &ImageRef, placement: &Placement) -> Result<()>;

    /// A bracketed note standing in for missing content.
    fn placeholder(&mut self, text: &str);

    /// A figure caption with its label emphasized.
    fn caption(&mut self, caption: &Caption);

    /// An italic line of extraction details.
    fn annotation(&mut self, text: &str);

    /// Start a new page.
    fn page_break(&mut self);

    /// Write the document to `path`, creating parent directories.
    fn finish(&mut self, path: &Path) -> Result<()>;
}

/// Output document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Office Open XML word processing document
    #[default]
    Docx,
    /// Markdown with image links
    Markdown,
}

impl OutputFormat {
    /// Markdown for `.md`/`.markdown` paths, DOCX otherwise.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext)
                if ext.eq_ignore_ascii_case("md") || ext.eq_ignore_ascii_case("markdown") =>
            {
                OutputFormat::Markdown
            }
            _ => OutputFormat::Docx,
        }
    }

    /// A fresh composer for a document that will be written to `output`.
    pub fn composer(self, output: &Path) -> Box<dyn Composer> {
        match self {
            OutputFormat::Docx => Box::new(DocxComposer::new()),
            OutputFormat::Markdown => {
                let base = output.parent().unwrap_or_else(|| Path::new(""));
                Box::new(MarkdownComposer::new(base))
            }
        }
    }
}

/// Size of an image on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub width_px: u32,
    pub height_px: u32,
    pub width_in: f64,
    pub height_in: f64,
}

impl Placement {
    /// Width in EMU.
    pub fn width_emu(&self) -> u32 {
        (self.width_in * EMU_PER_INCH).round() as u32
    }

    /// Height in EMU.
    pub fn height_emu(&self) -> u32 {
        (self.height_in * EMU_PER_INCH).round() as u32
    }
}

/// Scale an image file to `width_in`, keeping its aspect ratio.
///
/// Fails when the file cannot be read, its header cannot be decoded, or the
/// scaled height exceeds `max_height_in`.
pub fn fit_to_width(path: &Path, width_in: f64, max_height_in: f64) -> Result<Placement> {
    let (width_px, height_px) = image::image_dimensions(path)
        .map_err(|e| Error::Embed(format!("{}: {}", path.display(), e)))?;
    if width_px == 0 || height_px == 0 {
        return Err(Error::Embed(format!("{}: empty image", path.display())));
    }

    let height_in = width_in * f64::from(height_px) / f64::from(width_px);
    if height_in > max_height_in {
        return Err(Error::Embed(format!(
            "{}: {:.2}in tall at {:.2}in wide (page allows {:.2}in)",
            path.display(),
            height_in,
            width_in,
            max_height_in
        )));
    }

    Ok(Placement {
        width_px,
        height_px,
        width_in,
        height_in,
    })
}

/// Create the parent directory of an output file.
pub(crate) fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
