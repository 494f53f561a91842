//! # figcite
//!
//! Batch extraction of figures and figure captions from PDF documents,
//! with each document matched to an entry of a citation list.
//!
//! The result is one combined document (DOCX or Markdown) where every
//! figure is preceded by the matched citation and followed by its caption,
//! plus an optional CSV table mapping each PDF to its citation.
//!
//! ## Quick Start
//!
//! ```no_run
//! use figcite::BatchOptions;
//!
//! fn main() -> figcite::Result<()> {
//!     let options = BatchOptions::new("pdfs", "Citations.txt", "output/All.docx")
//!         .with_audit("output/map.csv");
//!
//!     let summary = figcite::run(&options, |_| {})?;
//!     println!("{} files, {} matched", summary.files, summary.matched);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Caption segmentation**: "Figure N." / "Fig. N:" blocks from the text layer
//! - **Image extraction**: JPEG and raw Gray/RGB/CMYK/Indexed images, size filtered
//! - **Title detection**: metadata title or the largest text on page one
//! - **Citation matching**: longest-matching-block similarity after normalization
//! - **Failure isolation**: a broken PDF degrades its own section only

pub mod assemble;
pub mod citations;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod parser;
pub mod render;
pub mod text;

// Re-export commonly used types
pub use assemble::{build_record, run, BatchEvent, BatchOptions, BatchSummary};
pub use citations::{load_citations, parse_citations};
pub use error::{Error, Result};
pub use extract::{extract_captions, ImageFilter, TitleOptions};
pub use model::{Caption, Degradation, DocumentRecord, ImageRef, RecordStatus, Stage};
pub use parser::PdfSource;
pub use render::{Composer, DocxComposer, EmbedOptions, MarkdownComposer, OutputFormat};
pub use text::{best_match, normalize_for_match, similarity, CitationMatch};

use std::path::Path;

/// Open a PDF file.
///
/// # Example
///
/// ```no_run
/// let source = figcite::open("paper.pdf").unwrap();
/// println!("Pages: {}", source.page_count());
/// ```
pub fn open<P: AsRef<Path>>(path: P) -> Result<PdfSource> {
    PdfSource::open(path)
}

/// Detect the title of a PDF file with default heuristics.
///
/// # Example
///
/// ```no_run
/// if let Some(title) = figcite::detect_title("paper.pdf").unwrap() {
///     println!("{}", title);
/// }
/// ```
pub fn detect_title<P: AsRef<Path>>(path: P) -> Result<Option<String>> {
    let source = PdfSource::open(path)?;
    extract::extract_title(&source, &TitleOptions::default())
}

/// Extract the figure captions of a PDF file, in text order.
///
/// # Example
///
/// ```no_run
/// for caption in figcite::captions("paper.pdf").unwrap() {
///     println!("{}", caption);
/// }
/// ```
pub fn captions<P: AsRef<Path>>(path: P) -> Result<Vec<Caption>> {
    let source = PdfSource::open(path)?;
    Ok(extract_captions(&source.full_text()?))
}

/// Save the large images of a PDF file into `out_dir` with the default filter.
pub fn save_images<P: AsRef<Path>, Q: AsRef<Path>>(path: P, out_dir: Q) -> Result<Vec<ImageRef>> {
    let source = PdfSource::open(path)?;
    extract::extract_images(&source, out_dir.as_ref(), &ImageFilter::default())
}
