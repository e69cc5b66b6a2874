//! Domain types for representing extracted and restyled slide text.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural role of a piece of slide text.
///
/// Advisory only: it feeds the preview and costing, never the rewrite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextContext {
    /// Short heading-like text without sentence punctuation.
    Title,
    /// Short text that reads like a fragment of a sentence.
    Short,
    /// A list item starting with a bullet glyph.
    Bullet,
    /// Everything else.
    Body,
}

impl TextContext {
    /// Lowercase label used in previews and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Short => "short",
            Self::Bullet => "bullet",
            Self::Body => "body",
        }
    }
}

impl fmt::Display for TextContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One de-duplicated literal string extracted from a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextUnit {
    /// Decoded, trimmed, non-empty text.
    pub content: String,

    /// Structural role assigned by the classifier.
    pub context: TextContext,
}

impl TextUnit {
    /// Create a unit with an explicit context.
    pub fn new(content: impl Into<String>, context: TextContext) -> Self {
        Self {
            content: content.into(),
            context,
        }
    }
}

/// Outcome of transforming one [`TextUnit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationResult {
    /// The unit's content as extracted.
    pub original: String,

    /// The transformed text, or `original` when the transform failed.
    pub translated: String,

    /// Whether the transform produced this text.
    pub succeeded: bool,
}

impl TranslationResult {
    /// A successful transform.
    pub fn success(original: impl Into<String>, translated: impl Into<String>) -> Self {
        Self {
            original: original.into(),
            translated: translated.into(),
            succeeded: true,
        }
    }

    /// A result that keeps the original text; `succeeded` records whether
    /// that was intended (blank input) or a fallback (failed call).
    pub fn unchanged(original: impl Into<String>, succeeded: bool) -> Self {
        let original = original.into();
        Self {
            translated: original.clone(),
            original,
            succeeded,
        }
    }

    /// Whether applying this result would change the markup.
    pub fn changes_text(&self) -> bool {
        !self.original.is_empty() && self.original != self.translated
    }
}

/// Read-only summary of one slide for the pre-translation preview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlidePreview {
    /// 1-based slide number parsed from the part name.
    pub slide_number: usize,

    /// Number of text units on the slide.
    pub unit_count: usize,

    /// Whitespace-delimited words across all units.
    pub word_count: usize,

    /// Presentation-layer cost estimate (not billing-accurate).
    pub estimated_cost: u64,

    /// Context of every unit, in inventory order.
    pub contexts: Vec<TextContext>,

    /// First few units joined, truncated with a marker.
    pub preview: String,
}

/// Preview of a whole deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeckPreview {
    /// Slides in ascending slide-number order.
    pub slides: Vec<SlidePreview>,

    /// Number of slide parts found.
    pub total_slides: usize,

    /// Sum of every slide's estimated cost.
    pub total_cost: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_result_keeps_original() {
        let result = TranslationResult::unchanged("Hello", false);
        assert_eq!(result.translated, "Hello");
        assert!(!result.succeeded);
        assert!(!result.changes_text());
    }

    #[test]
    fn test_changes_text_ignores_empty_original() {
        assert!(!TranslationResult::success("", "x").changes_text());
        assert!(TranslationResult::success("a", "b").changes_text());
    }

    #[test]
    fn test_context_serializes_lowercase() {
        let json = serde_json::to_string(&TextContext::Bullet).unwrap();
        assert_eq!(json, "\"bullet\"");
    }
}
