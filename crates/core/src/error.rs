//! Error types for deck restyling.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole analyze or translate operation.
///
/// Per-unit transform failures and reconciliation gaps are not errors at
/// this level; they are recovered locally and reported alongside the output.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The archive could not be opened or one of its entries is unreadable.
    #[error("Invalid or corrupted archive: {0}")]
    CorruptArchive(String),

    /// Writing the rewritten archive failed.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// A part that was asked for does not exist in the archive.
    #[error("Part not found in archive: {0}")]
    MissingPart(String),

    /// A part that should hold markup is not valid UTF-8.
    #[error("Part is not valid UTF-8 text: {0}")]
    InvalidPartEncoding(String),

    /// The requested style profile is not one of the known profiles.
    #[error("Unsupported style profile: {0}")]
    UnsupportedStyleProfile(String),

    /// The slide selection could not be parsed.
    #[error("Invalid slide selection: {0}")]
    InvalidSelection(String),

    /// A translate request named no slides.
    #[error("No slides selected for translation")]
    NoSlidesSelected,

    /// A single-text request had nothing to restyle.
    #[error("No text provided")]
    EmptyText,

    /// The transform failed for a single-text request.
    #[error("Transform failed: {0}")]
    TransformFailed(String),

    /// Configuration values were rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
