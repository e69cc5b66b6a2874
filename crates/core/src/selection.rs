//! Parsing of explicit slide selections such as `"2, 4, 7"`.

use crate::error::{Error, Result};
use std::collections::BTreeSet;

/// Parse a comma-separated list of 1-based slide numbers.
///
/// Blank entries are ignored; an empty list is [`Error::NoSlidesSelected`].
pub fn parse_slide_selection(input: &str) -> Result<BTreeSet<usize>> {
    let mut selected = BTreeSet::new();

    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let number: usize = part
            .parse()
            .map_err(|_| Error::InvalidSelection(format!("'{}' is not a slide number", part)))?;
        if number == 0 {
            return Err(Error::InvalidSelection(
                "slide numbers start at 1".to_string(),
            ));
        }
        selected.insert(number);
    }

    if selected.is_empty() {
        return Err(Error::NoSlidesSelected);
    }

    Ok(selected)
}
