//! Polling data model shared by the engine and its collaborators.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A reviewed homework submission reported by the review service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewAttempt {
    /// Title of the lesson the work was submitted for.
    pub lesson_title: String,
    /// Link to the lesson page.
    pub lesson_url: String,
    /// Whether the reviewer sent the work back with errors.
    pub is_negative: bool,
}

impl ReviewAttempt {
    /// Create a new attempt record.
    pub fn new(lesson_title: impl Into<String>, lesson_url: impl Into<String>, is_negative: bool) -> Self {
        Self {
            lesson_title: lesson_title.into(),
            lesson_url: lesson_url.into(),
            is_negative,
        }
    }
}

/// Resumption cursor issued by the review service.
///
/// The service hands out fractional UNIX timestamps and expects them back
/// verbatim in the `timestamp` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl fmt::Display for Timestamp {
    // f64's Display already drops the fractional part of integral values.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Body of a successful long-polling response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LongPollResponse {
    /// No reviews arrived within the poll window.
    Timeout {
        timestamp_to_request: Timestamp,
    },
    /// One or more reviews arrived.
    Found {
        last_attempt_timestamp: Timestamp,
        new_attempts: Vec<ReviewAttempt>,
    },
}

impl LongPollResponse {
    /// Decode a response body.
    ///
    /// Unknown `status` values and missing fields are errors.
    pub fn parse(body: &str) -> Result<Self> {
        Ok(serde_json::from_str(body)?)
    }

    /// Convert into the outcome the engine works with.
    pub fn into_outcome(self) -> PollOutcome {
        match self {
            LongPollResponse::Timeout { timestamp_to_request } => PollOutcome::Timeout {
                next_cursor: Some(timestamp_to_request),
            },
            LongPollResponse::Found {
                last_attempt_timestamp,
                new_attempts,
            } => PollOutcome::Found {
                next_cursor: last_attempt_timestamp,
                attempts: new_attempts,
            },
        }
    }
}

/// Classified result of a single long-polling request.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Nothing new within the window.
    ///
    /// `next_cursor` is `None` when the transport timed out before the
    /// service answered; the current cursor is then kept.
    Timeout { next_cursor: Option<Timestamp> },
    /// New reviews, in the order the service returned them.
    Found {
        next_cursor: Timestamp,
        attempts: Vec<ReviewAttempt>,
    },
    /// The service could not be reached.
    TransientError(String),
    /// Any other failure: bad status, malformed body, delivery problems.
    ///
    /// Retried like `TransientError` but always reported through the alert sink.
    Unexpected(String),
}

impl PollOutcome {
    /// Short label used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PollOutcome::Timeout { .. } => "timeout",
            PollOutcome::Found { .. } => "found",
            PollOutcome::TransientError(_) => "transient_error",
            PollOutcome::Unexpected(_) => "unexpected",
        }
    }
}
