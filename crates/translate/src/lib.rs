//! Transform orchestration and the whole-deck analyze/translate pipeline.
//!
//! The transform itself (prompting a language model) is an external
//! collaborator behind [`TextTransform`]; this crate decides how many calls
//! run at once, what happens when one fails, and how results find their way
//! back into the archive.

pub mod mock;
pub mod orchestrator;
pub mod pipeline;
pub mod transform;

pub use mock::{MockBehavior, MockTransform};
pub use orchestrator::{ProgressCallback, ProgressEvent, TranslationOrchestrator};
pub use pipeline::{analyze_deck, restyle_text, translate_deck, TranslationReport, UnitIssue};
pub use transform::{TextTransform, TransformError};
