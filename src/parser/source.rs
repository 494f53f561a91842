//! An opened PDF file: lopdf object graph plus the raw bytes.

use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::detect::pdf_version;
use crate::error::{Error, Result};

/// Page-tree nesting deeper than this is treated as a cycle.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// An opened PDF document.
///
/// The source owns everything it read from disk. Dropping it releases the
/// document, whichever extraction steps succeeded.
pub struct PdfSource {
    path: PathBuf,
    doc: LopdfDocument,
    bytes: Vec<u8>,
}

impl PdfSource {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let mut source = Self::from_bytes(bytes)?;
        source.path = path.to_path_buf();
        Ok(source)
    }

    /// Load a PDF held in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        pdf_version(&bytes)?;

        let doc = LopdfDocument::load_mem(&bytes).map_err(|e| match e {
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::from(e),
        })?;

        Ok(Self {
            path: PathBuf::new(),
            doc,
            bytes,
        })
    }

    /// Path the document was opened from (empty for in-memory sources).
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// Pages as (1-based page number → object id).
    pub fn pages(&self) -> BTreeMap<u32, ObjectId> {
        self.doc.get_pages()
    }

    /// Number of pages.
    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Object id of a 1-based page number.
    pub fn page_id(&self, page_num: u32) -> Result<ObjectId> {
        let pages = self.doc.get_pages();
        pages
            .get(&page_num)
            .copied()
            .ok_or(Error::PageOutOfRange(page_num, pages.len() as u32))
    }

    /// The `Title` entry of the document information dictionary, if any.
    pub fn metadata_title(&self) -> Option<String> {
        let info = self.doc.trailer.get(b"Info").ok()?;
        let info_dict = match info {
            Object::Reference(r) => self.doc.get_dictionary(*r).ok()?,
            Object::Dictionary(d) => d,
            _ => return None,
        };
        get_string_from_dict(info_dict, b"Title")
    }

    /// Plain text of every page, concatenated in page order.
    ///
    /// pdf-extract gives the best line structure but can panic on malformed
    /// input, so it runs under `catch_unwind` and lopdf's own per-page text
    /// extraction is the fallback.
    pub fn full_text(&self) -> Result<String> {
        let attempt = catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(&self.bytes)
        }));

        match attempt {
            Ok(Ok(text)) if !text.trim().is_empty() => return Ok(text),
            Ok(Ok(_)) => log::debug!("pdf-extract found no text in {}", self.path.display()),
            Ok(Err(e)) => log::debug!("pdf-extract failed on {}: {}", self.path.display(), e),
            Err(_) => log::warn!("pdf-extract panicked on {}", self.path.display()),
        }

        let pages = self.pages();
        let mut texts = Vec::with_capacity(pages.len());
        let mut last_error = None;
        for page_num in pages.keys() {
            match self.doc.extract_text(&[*page_num]) {
                Ok(text) => texts.push(text),
                Err(e) => {
                    last_error = Some(Error::TextExtract(format!("Page {}: {}", page_num, e)))
                }
            }
        }

        match last_error {
            Some(e) if texts.is_empty() => Err(e),
            _ => Ok(texts.join("\n")),
        }
    }

    /// The resource dictionary in effect for a page.
    ///
    /// Resources may be inherited from any ancestor in the page tree.
    pub fn page_resources(&self, page_id: ObjectId) -> Option<&Dictionary> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        for _ in 0..MAX_PAGE_TREE_DEPTH {
            if let Ok(res) = node.get(b"Resources") {
                return self.resolve_dict(res);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Follow a reference if needed and return the dictionary it names.
    pub fn resolve_dict<'a>(&'a self, obj: &'a Object) -> Option<&'a Dictionary> {
        match obj {
            Object::Reference(r) => match self.doc.get_object(*r).ok()? {
                Object::Dictionary(d) => Some(d),
                Object::Stream(s) => Some(&s.dict),
                _ => None,
            },
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    /// Follow a reference if needed.
    pub fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(r) => self.doc.get_object(*r).ok(),
            other => Some(other),
        }
    }
}

/// Read a text string from a PDF dictionary.
fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Decode a PDF text string: UTF-16 with BOM, UTF-8, or Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] == 0xFE {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_pdf_string_utf16be() {
        let bytes = [0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69];
        assert_eq!(decode_pdf_string(&bytes), "Hi");
    }

    #[test]
    fn test_decode_pdf_string_latin1() {
        let bytes = [0x43, 0x61, 0x66, 0xE9];
        assert_eq!(decode_pdf_string(&bytes), "Café");
    }

    #[test]
    fn test_decode_pdf_string_utf8() {
        assert_eq!(decode_pdf_string("Ωmega".as_bytes()), "Ωmega");
    }

    #[test]
    fn test_from_bytes_rejects_non_pdf() {
        assert!(matches!(
            PdfSource::from_bytes(b"not a pdf at all".to_vec()),
            Err(Error::UnknownFormat)
        ));
    }

    #[test]
    fn test_from_bytes_rejects_truncated_pdf() {
        assert!(PdfSource::from_bytes(b"%PDF-1.4\n".to_vec()).is_err());
    }
}
