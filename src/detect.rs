//! PDF header sniffing and input file recognition.

use std::path::Path;

use crate::error::{Error, Result};

/// Extension of the files collected from the input tree.
pub const PDF_EXTENSION: &str = "pdf";

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Readers accept a header anywhere in the first kilobyte.
const HEADER_WINDOW: usize = 1024;

/// Check the `%PDF-x.y` header and return the declared version.
pub fn pdf_version(data: &[u8]) -> Result<String> {
    let window = &data[..data.len().min(HEADER_WINDOW)];
    let start = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version = data
        .get(start + PDF_MAGIC.len()..start + PDF_MAGIC.len() + 3)
        .ok_or(Error::UnknownFormat)?;

    match version {
        [major, b'.', minor] if major.is_ascii_digit() && minor.is_ascii_digit() => {
            Ok(String::from_utf8_lossy(version).into_owned())
        }
        _ => Err(Error::UnknownFormat),
    }
}

/// Whether `path` names a file the batch should pick up.
///
/// The comparison is case-sensitive: `report.PDF` is skipped.
pub fn is_pdf_path(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(PDF_EXTENSION)
}
