//! Error types for the runtime crate.

use thiserror::Error;

/// Errors that can occur while talking to collaborators.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The review service answered with a non-success status.
    #[error("review service returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("malformed response: {0}")]
    Parse(#[from] reviewbot_core::CoreError),

    /// A message could not be delivered to the chat.
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Result type for runtime operations.
pub type Result<T> = std::result::Result<T, RuntimeError>;
