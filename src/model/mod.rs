//! Extraction results shared by the assembler and the composers.
//!
//! A [`DocumentRecord`] is built once per input file and not changed after
//! assembly. Composers only read it.

mod figure;
mod record;

pub use figure::{Caption, ImageRef};
pub use record::{Degradation, DocumentRecord, RecordStatus, Stage};
