//! Text inventory extraction from slide markup.

use crate::markup::{decode_text, paragraphs, scan, text_runs};
use regex::Regex;
use restyle_core::{classify, TextUnit};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Regex to collapse whitespace runs into a single space.
static WHITESPACE_COLLAPSE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extracts the de-duplicated text inventory of one slide.
#[derive(Debug, Clone, Default)]
pub struct TextExtractor;

impl TextExtractor {
    /// Create a new extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extract text units from a slide's markup.
    ///
    /// Text-run elements are collected first, in document order. Paragraphs
    /// without any text-run element then contribute their flattened text.
    /// Each literal string appears once; the first occurrence wins. The
    /// result depends only on `xml`.
    pub fn extract(&self, xml: &str) -> Vec<TextUnit> {
        let nodes = scan(xml);
        let mut seen: HashSet<String> = HashSet::new();
        let mut units = Vec::new();

        for run in text_runs(&nodes) {
            let text = decode_text(&xml[run]);
            push_unique(&mut units, &mut seen, text.trim());
        }

        for paragraph in paragraphs(&nodes).into_iter().filter(|p| !p.has_run) {
            let joined = paragraph
                .texts
                .iter()
                .map(|span| decode_text(&xml[span.clone()]))
                .collect::<Vec<_>>()
                .join(" ");
            let flattened = WHITESPACE_COLLAPSE_REGEX.replace_all(&joined, " ");
            push_unique(&mut units, &mut seen, flattened.trim());
        }

        log::debug!("Extracted {} text units", units.len());
        units
    }
}

fn push_unique(units: &mut Vec<TextUnit>, seen: &mut HashSet<String>, text: &str) {
    if text.is_empty() || seen.contains(text) {
        return;
    }

    seen.insert(text.to_string());
    let unit = TextUnit::new(text, classify(text));
    log::trace!("Extracted text ({}): {:?}", unit.context, unit.content);
    units.push(unit);
}
