//! Substitution of transformed text back into slide markup.
//!
//! Each result is applied with the first of three passes that finds at least
//! one occurrence, and that pass is applied wholesale:
//!
//! 1. [`MatchPass::Scoped`]: text-run elements whose whole (trimmed) content
//!    is the original text.
//! 2. [`MatchPass::Encoded`]: the entity-encoded original anywhere in
//!    character data.
//! 3. [`MatchPass::Raw`]: the original exactly as written, for markup that
//!    was never properly encoded.
//!
//! Text written for one result is locked, so later results cannot match
//! inside it even when the translation happens to contain their original.

use crate::markup::{decode_text, encode_text, entity_refs, scan, text_runs, text_spans};
use restyle_core::TranslationResult;
use std::ops::Range;

/// Which substitution pass matched a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPass {
    /// Sole content of a text-run element.
    Scoped,
    /// Entity-encoded substring of character data.
    Encoded,
    /// Unencoded substring of character data.
    Raw,
}

/// One result that was written into the markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    /// Original text of the unit.
    pub original: String,
    /// Pass that matched.
    pub pass: MatchPass,
    /// Number of occurrences replaced.
    pub occurrences: usize,
}

/// Rewritten markup plus a record of what was and was not applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewriteOutcome {
    /// The rewritten markup.
    pub xml: String,
    /// Results that were written, in input order.
    pub replacements: Vec<Replacement>,
    /// Originals that no pass could locate, in input order.
    pub gaps: Vec<String>,
}

/// Applies translation results to one slide's markup.
#[derive(Debug, Clone, Default)]
pub struct MarkupRewriter;

impl MarkupRewriter {
    /// Create a new rewriter.
    pub fn new() -> Self {
        Self
    }

    /// Apply `results` to `xml`.
    ///
    /// Results that do not change text (failed, blank or identical) are
    /// skipped. Unmatched results are reported as gaps; they never make the
    /// rewrite fail.
    pub fn rewrite(&self, xml: &str, results: &[TranslationResult]) -> RewriteOutcome {
        let mut draft = Draft::new(xml);
        let mut replacements = Vec::new();
        let mut gaps = Vec::new();

        for result in results {
            if !result.changes_text() || result.translated.trim().is_empty() {
                continue;
            }

            match draft.apply_result(&result.original, &result.translated) {
                Some((pass, occurrences)) => {
                    log::debug!(
                        "Replaced {:?} ({} occurrences, {:?} pass)",
                        result.original,
                        occurrences,
                        pass
                    );
                    replacements.push(Replacement {
                        original: result.original.clone(),
                        pass,
                        occurrences,
                    });
                }
                None => {
                    log::warn!("Could not find text to replace: {:?}", result.original);
                    gaps.push(result.original.clone());
                }
            }
        }

        RewriteOutcome {
            xml: draft.xml,
            replacements,
            gaps,
        }
    }
}

/// Markup being rewritten, with the byte ranges already written by earlier results.
struct Draft {
    xml: String,
    locked: Vec<Range<usize>>,
}

impl Draft {
    fn new(xml: &str) -> Self {
        Self {
            xml: xml.to_string(),
            locked: Vec::new(),
        }
    }

    fn apply_result(&mut self, original: &str, translated: &str) -> Option<(MatchPass, usize)> {
        let (pass, ranges) = self
            .find_matches(MatchPass::Scoped, original)
            .or_else(|| self.find_matches(MatchPass::Encoded, original))
            .or_else(|| self.find_matches(MatchPass::Raw, original))?;

        let occurrences = ranges.len();
        self.splice(ranges, &encode_text(translated));
        Some((pass, occurrences))
    }

    fn find_matches(
        &self,
        pass: MatchPass,
        original: &str,
    ) -> Option<(MatchPass, Vec<Range<usize>>)> {
        let ranges = match pass {
            MatchPass::Scoped => self.scoped_matches(original),
            MatchPass::Encoded => self.substring_matches(&encode_text(original)),
            MatchPass::Raw => self.substring_matches(original),
        };
        (!ranges.is_empty()).then_some((pass, ranges))
    }

    /// Trimmed content of every simple text run whose decoded text is `original`.
    fn scoped_matches(&self, original: &str) -> Vec<Range<usize>> {
        let nodes = scan(&self.xml);

        text_runs(&nodes)
            .into_iter()
            .filter_map(|run| {
                let raw = &self.xml[run.clone()];
                if decode_text(raw).trim() != original {
                    return None;
                }
                let lead = raw.len() - raw.trim_start().len();
                let trail = raw.len() - raw.trim_end().len();
                let target = run.start + lead..run.end - trail;
                self.is_free(&target).then_some(target)
            })
            .collect()
    }

    /// Every unlocked occurrence of `needle` inside character data.
    fn substring_matches(&self, needle: &str) -> Vec<Range<usize>> {
        if needle.is_empty() {
            return Vec::new();
        }

        let nodes = scan(&self.xml);
        let mut ranges = Vec::new();

        for span in text_spans(&nodes) {
            let text = &self.xml[span.clone()];
            let refs = entity_refs(text);

            for (offset, _) in text.match_indices(needle) {
                // A match may not start or end inside an entity reference.
                let end = offset + needle.len();
                if refs.iter().any(|r| splits(r, offset) || splits(r, end)) {
                    continue;
                }

                let target = span.start + offset..span.start + end;
                if self.is_free(&target) {
                    ranges.push(target);
                }
            }
        }

        ranges
    }

    fn is_free(&self, range: &Range<usize>) -> bool {
        self.locked
            .iter()
            .all(|l| l.end <= range.start || l.start >= range.end)
    }

    /// Replace ascending, non-overlapping `ranges` and lock the new text.
    fn splice(&mut self, ranges: Vec<Range<usize>>, replacement: &str) {
        let mut out = String::with_capacity(self.xml.len() + ranges.len() * replacement.len());
        let mut written = Vec::with_capacity(ranges.len());
        let mut cursor = 0;

        for range in &ranges {
            out.push_str(&self.xml[cursor..range.start]);
            let start = out.len();
            out.push_str(replacement);
            written.push(start..out.len());
            cursor = range.end;
        }
        out.push_str(&self.xml[cursor..]);

        // Locked ranges never overlap a replaced range, so each one only
        // moves by the size change of the replacements before it.
        let shift = |pos: usize| -> usize {
            let mut moved = pos as isize;
            for range in ranges.iter().take_while(|r| r.end <= pos) {
                moved += replacement.len() as isize - (range.end - range.start) as isize;
            }
            moved as usize
        };
        let mut locked: Vec<Range<usize>> = self
            .locked
            .iter()
            .map(|l| shift(l.start)..shift(l.end))
            .collect();
        locked.extend(written);
        locked.sort_by_key(|r| r.start);

        self.xml = out;
        self.locked = locked;
    }
}

/// Whether `pos` falls strictly inside `range`.
fn splits(range: &Range<usize>, pos: usize) -> bool {
    range.start < pos && pos < range.end
}
