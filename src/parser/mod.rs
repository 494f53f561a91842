//! PDF access: opened documents and positioned page text.

mod layout;
mod source;

pub use layout::{SpanExtractor, TextSpan};
pub use source::PdfSource;
