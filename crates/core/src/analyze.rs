//! Per-slide word counts and cost estimates for the pre-translation preview.
//!
//! The cost figure is a rough presentation-layer estimate derived from the
//! word count only. It is not billing-accurate and must not be used as such.

use crate::config::{PipelineConfig, MINIMUM_COST_FLOOR};
use crate::types::{DeckPreview, SlidePreview, TextUnit};

/// Marker appended to a truncated preview.
const TRUNCATION_MARKER: &str = "...";

/// Separator between units in a slide preview.
const PREVIEW_SEPARATOR: &str = " | ";

/// Builds [`SlidePreview`]s from extracted text units.
#[derive(Debug, Clone)]
pub struct SlideAnalyzer {
    cost_per_word: f64,
    minimum_cost: u64,
    preview_units: usize,
    preview_chars: usize,
}

impl Default for SlideAnalyzer {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl SlideAnalyzer {
    /// Create an analyzer with the default rate and preview settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an analyzer from pipeline configuration.
    ///
    /// A minimum cost below [`MINIMUM_COST_FLOOR`] is raised to it.
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            cost_per_word: config.cost_per_word,
            minimum_cost: config.minimum_cost.max(MINIMUM_COST_FLOOR),
            preview_units: config.preview_units,
            preview_chars: config.preview_chars,
        }
    }

    /// Summarize one slide's inventory.
    pub fn summarize(&self, slide_number: usize, units: &[TextUnit]) -> SlidePreview {
        let word_count = word_count(units);

        SlidePreview {
            slide_number,
            unit_count: units.len(),
            word_count,
            estimated_cost: self.estimate_cost(word_count),
            contexts: units.iter().map(|u| u.context).collect(),
            preview: self.preview_text(units),
        }
    }

    /// Combine slide previews into a deck preview with a total cost.
    pub fn summarize_deck(&self, slides: Vec<SlidePreview>) -> DeckPreview {
        let total_cost = slides.iter().map(|s| s.estimated_cost).sum();
        DeckPreview {
            total_slides: slides.len(),
            slides,
            total_cost,
        }
    }

    /// `max(minimum_cost, ceil(words * rate))`.
    pub fn estimate_cost(&self, word_count: usize) -> u64 {
        let raw = (word_count as f64 * self.cost_per_word).ceil() as u64;
        raw.max(self.minimum_cost)
    }

    fn preview_text(&self, units: &[TextUnit]) -> String {
        let head = units
            .iter()
            .take(self.preview_units)
            .map(|u| u.content.as_str())
            .collect::<Vec<_>>()
            .join(PREVIEW_SEPARATOR);
        let mut preview: String = head.chars().take(self.preview_chars).collect();

        let full_len: usize = units.iter().map(|u| u.content.chars().count()).sum::<usize>()
            + units.len().saturating_sub(1);
        if full_len > self.preview_chars {
            preview.push_str(TRUNCATION_MARKER);
        }

        preview
    }
}

/// Whitespace-delimited tokens across all unit contents.
pub fn word_count(units: &[TextUnit]) -> usize {
    units
        .iter()
        .map(|u| u.content.split_whitespace().count())
        .sum()
}
