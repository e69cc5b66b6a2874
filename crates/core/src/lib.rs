//! Core domain types, style profiles, text classification and cost preview
//! for restyling the text of PowerPoint decks.

pub mod analyze;
pub mod classify;
pub mod config;
pub mod error;
pub mod profile;
pub mod selection;
pub mod types;

pub use analyze::SlideAnalyzer;
pub use classify::classify;
pub use config::{PipelineConfig, MINIMUM_COST_FLOOR};
pub use error::{Error, Result};
pub use profile::StyleProfile;
pub use selection::parse_slide_selection;
pub use types::{DeckPreview, SlidePreview, TextContext, TextUnit, TranslationResult};
