//! Heuristic extraction of titles, captions and figures from an opened PDF.
//!
//! Each extractor works on its own and may fail without affecting the
//! others; the assembler records failures on the document record.

mod caption;
mod image;
mod options;
mod title;

pub use caption::extract_captions;
pub use image::{
    cmyk_to_rgb, decode_image_stream, extract_images, page_image_ids, ColorModel, RawImage,
};
pub use options::{ImageFilter, TitleOptions, DEFAULT_REJECTED_PREFIXES};
pub use title::{extract_title, title_from_spans};
