//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur while loading configuration or decoding payloads.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A required environment variable is not set.
    #[error("{0} not set. Add it to the environment or to .env")]
    MissingVar(&'static str),

    /// An environment variable is set but its value is unusable.
    #[error("invalid value for {name}: {reason}")]
    InvalidVar {
        name: &'static str,
        reason: String,
    },

    /// JSON decoding error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
