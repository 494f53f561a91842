//! Error types for figcite.

use std::any::Any;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for figcite operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while building a figure collection.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file is not recognized as a PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted.
    #[error("Document is encrypted")]
    Encrypted,

    /// Error extracting text content.
    #[error("Text extraction error: {0}")]
    TextExtract(String),

    /// Error decoding or saving an embedded image.
    #[error("Image extraction error: {0}")]
    ImageExtract(String),

    /// The image uses an encoding or color model that cannot be decoded.
    #[error("Unsupported image: {0}")]
    UnsupportedImage(String),

    /// An image could not be placed in the output document.
    #[error("Image embedding error: {0}")]
    Embed(String),

    /// Error writing the combined output document.
    #[error("Rendering error: {0}")]
    Render(String),

    /// Error writing the audit table.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Error walking the input directory tree.
    #[error("Cannot read input tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// The citation list could not be read.
    #[error("Cannot read citations from {path}: {source}")]
    Citations {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A decoder panicked on malformed input.
    #[error("Extraction panicked: {0}")]
    Panic(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),
}

impl Error {
    /// Wrap the payload of a caught panic.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Error::Panic(message)
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::TextExtract(err.to_string())
    }
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        match err {
            image::ImageError::IoError(e) => Error::Io(e),
            image::ImageError::Unsupported(e) => Error::UnsupportedImage(e.to_string()),
            _ => Error::ImageExtract(err.to_string()),
        }
    }
}
