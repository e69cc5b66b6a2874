//! The external text-transform collaborator.

use async_trait::async_trait;
use restyle_core::StyleProfile;
use std::fmt::Debug;
use std::time::Duration;
use thiserror::Error;

/// Errors a transform call can end with.
///
/// Every variant is recovered per unit: the unit keeps its original text.
#[derive(Error, Debug)]
pub enum TransformError {
    /// The request could not be sent or the connection failed.
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// The service answered with an error status.
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the service
        message: String,
    },

    /// The response body could not be understood.
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The service returned no usable text.
    #[error("Transform returned an empty response")]
    EmptyResponse,

    /// The call did not finish within its timeout.
    #[error("Transform timed out after {0:?}")]
    Timeout(Duration),

    /// The task running the call panicked or was cancelled.
    #[error("Transform task aborted: {0}")]
    Aborted(String),
}

/// Rewrites one piece of text in the voice of a style profile.
///
/// Implementations make a single attempt; timeouts and concurrency limits
/// are applied by the caller.
#[async_trait]
pub trait TextTransform: Send + Sync + Debug {
    /// Transform `text` for `profile`.
    async fn transform(&self, text: &str, profile: StyleProfile) -> Result<String, TransformError>;
}
