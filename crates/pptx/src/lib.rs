//! PPTX (Office Open XML) backend for deck restyling.
//!
//! Opens .pptx files (ZIP archives containing XML documents), extracts the
//! text inventory of each slide and writes transformed text back without
//! disturbing any other markup or archive entry.

pub mod archive;
pub mod extract;
pub mod markup;
pub mod rewrite;

pub use archive::{Archive, SlidePart};
pub use extract::TextExtractor;
pub use markup::{decode_text, encode_text, is_well_formed};
pub use rewrite::{MarkupRewriter, MatchPass, Replacement, RewriteOutcome};
