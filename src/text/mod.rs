//! String utilities used for citation matching.

pub mod fuzzy;
pub mod markup;
mod normalize;

pub use fuzzy::{best_match, similarity, CitationMatch, SequenceMatcher};
pub use markup::{decode_entities, strip_markup};
pub use normalize::{collapse_whitespace, normalize_for_match};
