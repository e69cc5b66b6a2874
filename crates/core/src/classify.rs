//! Length and punctuation heuristics that tag extracted text with a context.

use crate::types::TextContext;

/// Longest text (in characters) that can still be a title.
const TITLE_MAX_CHARS: usize = 30;

/// Longest text (in characters) that counts as short.
const SHORT_MAX_CHARS: usize = 20;

/// Leading glyphs that mark a bullet item.
const BULLET_GLYPHS: &[char] = &['•', '-'];

/// Assign a context to already-trimmed text.
///
/// Rules are checked in a fixed order and the first match wins:
/// 1. `title`: at most 30 characters with no `.` or `,`
/// 2. `short`: at most 20 characters
/// 3. `bullet`: starts with `•` or `-`
/// 4. `body`
pub fn classify(text: &str) -> TextContext {
    let len = text.chars().count();

    if len <= TITLE_MAX_CHARS && !text.contains('.') && !text.contains(',') {
        TextContext::Title
    } else if len <= SHORT_MAX_CHARS {
        TextContext::Short
    } else if text.starts_with(BULLET_GLYPHS) {
        TextContext::Bullet
    } else {
        TextContext::Body
    }
}
