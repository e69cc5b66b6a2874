//! Whole-deck analyze and translate paths, plus single-text restyling.

use restyle_core::{
    DeckPreview, Error, Result, SlideAnalyzer, StyleProfile, TextUnit, TranslationResult,
};
use restyle_pptx::{is_well_formed, Archive, MarkupRewriter, SlidePart, TextExtractor};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::orchestrator::TranslationOrchestrator;

/// A unit-level problem that was recovered from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitIssue {
    /// Slide the unit belongs to.
    pub slide_number: usize,
    /// The unit's original text.
    pub original: String,
}

/// Output of [`translate_deck`].
#[derive(Debug, Clone, Serialize)]
pub struct TranslationReport {
    /// The rewritten archive.
    #[serde(skip)]
    pub bytes: Vec<u8>,

    /// Selected slides that exist in the deck and were processed, ascending.
    pub translated_slides: Vec<usize>,

    /// Units whose transform failed and that kept their original text.
    pub failures: Vec<UnitIssue>,

    /// Transformed units that could not be matched back into their slide.
    pub gaps: Vec<UnitIssue>,

    /// Slides whose rewrite broke well-formed markup and was discarded.
    pub rolled_back: Vec<usize>,

    /// Selected slides left untouched because their part is not UTF-8 text.
    pub skipped_slides: Vec<usize>,
}

impl TranslationReport {
    /// Whether every selected unit was transformed and written back.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
            && self.gaps.is_empty()
            && self.rolled_back.is_empty()
            && self.skipped_slides.is_empty()
    }
}

/// One slide read from the archive.
struct LoadedSlide {
    part: SlidePart,
    xml: String,
    units: Vec<TextUnit>,
}

impl LoadedSlide {
    fn new(part: SlidePart, xml: String, extractor: &TextExtractor) -> Self {
        let units = extractor.extract(&xml);
        log::debug!("Slide {} has {} text units", part.number, units.len());
        Self { part, xml, units }
    }
}

/// Build the pre-translation preview of a deck.
///
/// Slides that are not valid UTF-8 are decoded lossily, so one bad part
/// never hides the rest of the deck.
pub fn analyze_deck(bytes: Vec<u8>, analyzer: &SlideAnalyzer) -> Result<DeckPreview> {
    let archive = Archive::open(bytes)?;
    let extractor = TextExtractor::new();

    let previews = archive
        .slide_parts()
        .into_iter()
        .map(|part| {
            let xml = archive.read_text_lossy(&part.name)?;
            let slide = LoadedSlide::new(part, xml, &extractor);
            Ok(analyzer.summarize(slide.part.number, &slide.units))
        })
        .collect::<Result<Vec<_>>>()?;

    let preview = analyzer.summarize_deck(previews);
    log::info!(
        "Analyzed {} slides (estimated cost {})",
        preview.total_slides,
        preview.total_cost
    );
    Ok(preview)
}

/// Restyle the selected slides of a deck.
///
/// The profile and selection are validated before the archive is touched.
/// All transform calls finish before any slide is rewritten; slides that are
/// not selected keep their exact bytes. Unit-level and slide-level problems
/// are reported in the [`TranslationReport`]; only archive-level problems are
/// errors.
pub async fn translate_deck(
    bytes: Vec<u8>,
    profile: &str,
    selection: &BTreeSet<usize>,
    orchestrator: &TranslationOrchestrator,
) -> Result<TranslationReport> {
    let profile: StyleProfile = profile.parse()?;
    if selection.is_empty() {
        return Err(Error::NoSlidesSelected);
    }

    let mut archive = Archive::open(bytes)?;
    let extractor = TextExtractor::new();
    let mut report = TranslationReport {
        bytes: Vec::new(),
        translated_slides: Vec::new(),
        failures: Vec::new(),
        gaps: Vec::new(),
        rolled_back: Vec::new(),
        skipped_slides: Vec::new(),
    };

    let parts: Vec<SlidePart> = archive
        .slide_parts()
        .into_iter()
        .filter(|p| selection.contains(&p.number))
        .collect();

    for missing in selection
        .iter()
        .filter(|n| !parts.iter().any(|p| p.number == **n))
    {
        log::warn!("Slide {} is not in the deck, skipping", missing);
    }

    let mut slides = Vec::with_capacity(parts.len());
    for part in parts {
        match archive.read_text(&part.name) {
            Ok(xml) => slides.push(LoadedSlide::new(part, xml, &extractor)),
            Err(Error::InvalidPartEncoding(name)) => {
                log::warn!("Slide {} ({}) is not valid UTF-8, leaving it as-is", part.number, name);
                report.skipped_slides.push(part.number);
            }
            Err(e) => return Err(e),
        }
    }

    // One batch for the whole selection keeps a single concurrency bound and
    // a single progress count.
    let batch: Vec<TextUnit> = slides.iter().flat_map(|s| s.units.iter().cloned()).collect();
    log::info!(
        "Translating {} units on {} slides for {}",
        batch.len(),
        slides.len(),
        profile
    );
    let mut results = orchestrator.translate(&batch, profile).await.into_iter();

    let rewriter = MarkupRewriter::new();
    for slide in slides {
        let number = slide.part.number;
        let slide_results: Vec<TranslationResult> =
            results.by_ref().take(slide.units.len()).collect();

        report.failures.extend(
            slide_results
                .iter()
                .filter(|r| !r.succeeded)
                .map(|r| issue(number, &r.original)),
        );

        let outcome = rewriter.rewrite(&slide.xml, &slide_results);
        report
            .gaps
            .extend(outcome.gaps.iter().map(|original| issue(number, original)));

        if commit_slide(&mut archive, &slide, &outcome.xml)? {
            log::info!(
                "Slide {}: {} replaced, {} gaps",
                number,
                outcome.replacements.len(),
                outcome.gaps.len()
            );
        } else {
            report.rolled_back.push(number);
        }

        report.translated_slides.push(number);
    }

    report.bytes = archive.serialize()?;

    if !report.is_complete() {
        log::warn!(
            "Translation finished with {} failed units, {} gaps, \
             {} rolled back and {} skipped slides",
            report.failures.len(),
            report.gaps.len(),
            report.rolled_back.len(),
            report.skipped_slides.len()
        );
    }

    Ok(report)
}

/// Restyle a single piece of text.
///
/// Unlike the deck path, a failed transform is an error here: there is no
/// original document to fall back to.
pub async fn restyle_text(
    text: &str,
    profile: &str,
    orchestrator: &TranslationOrchestrator,
) -> Result<String> {
    let profile: StyleProfile = profile.parse()?;
    if text.trim().is_empty() {
        return Err(Error::EmptyText);
    }

    orchestrator
        .transform_one(text.trim(), profile)
        .await
        .map_err(|e| Error::TransformFailed(e.to_string()))
}

/// Write a rewritten slide back unless the rewrite broke markup that was
/// well-formed before. Returns whether the rewrite was kept.
fn commit_slide(archive: &mut Archive, slide: &LoadedSlide, rewritten: &str) -> Result<bool> {
    if rewritten != slide.xml && is_well_formed(&slide.xml) && !is_well_formed(rewritten) {
        log::warn!(
            "Rewrite of slide {} produced malformed markup, keeping the original",
            slide.part.number
        );
        return Ok(false);
    }

    archive.write_text(&slide.part.name, rewritten)?;
    Ok(true)
}

fn issue(slide_number: usize, original: &str) -> UnitIssue {
    UnitIssue {
        slide_number,
        original: original.to_string(),
    }
}
