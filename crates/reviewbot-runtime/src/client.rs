//! HTTP client for the dvmn.org long-polling API.
//!
//! The service holds each request open until a review arrives or its own
//! window elapses. A client-side timeout slightly past that window is the
//! normal "nothing new" signal, not an error.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Url;
use reviewbot_core::{LongPollResponse, PollOutcome, RelayConfig, Timestamp};
use tracing::{debug, trace};

use crate::error::{Result, RuntimeError};
use crate::source::ReviewSource;

/// Longest slice of an error body kept in error messages.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Time allowed for establishing the TCP/TLS connection.
///
/// Kept well below the poll window so an unreachable host reports a
/// connect failure instead of an elapsed poll window.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Long-polling client for the review service.
#[derive(Clone)]
pub struct DvmnClient {
    client: reqwest::Client,
    url: Url,
    api_token: String,
    timeout: Duration,
}

impl DvmnClient {
    /// Create a client for the given endpoint.
    pub fn new(url: Url, api_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT.min(timeout))
            .build()?;
        Ok(Self {
            client,
            url,
            api_token: api_token.into(),
            timeout,
        })
    }

    /// Create a client from the loaded configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        Self::new(config.api_url.clone(), config.api_token.clone(), config.poll_timeout)
    }

    /// Issue one long-polling request.
    pub async fn request(&self, cursor: Option<Timestamp>) -> Result<LongPollResponse> {
        let mut request = self
            .client
            .get(self.url.clone())
            .header(AUTHORIZATION, format!("Token {}", self.api_token))
            .timeout(self.timeout);
        if let Some(cursor) = cursor {
            request = request.query(&[("timestamp", cursor.to_string())]);
        }

        trace!(url = %self.url, cursor = ?cursor, "Sending long-polling request");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(RuntimeError::Status {
                status,
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(LongPollResponse::parse(&body)?)
    }
}

/// Map a failed request to its outcome.
///
/// Connect failures, including connect timeouts, are checked first so an
/// unreachable host backs off instead of looking like an empty poll window.
/// A connection dropped or reset after connecting is also transient.
pub fn classify_error(error: &RuntimeError) -> PollOutcome {
    match error {
        RuntimeError::Http(e) if e.is_connect() => PollOutcome::TransientError(error.to_string()),
        RuntimeError::Http(e) if e.is_timeout() => PollOutcome::Timeout { next_cursor: None },
        RuntimeError::Http(e) if is_connection_lost(e) => {
            PollOutcome::TransientError(error.to_string())
        }
        _ => PollOutcome::Unexpected(error.to_string()),
    }
}

/// Whether the connection broke while sending the request or reading the body.
fn is_connection_lost(error: &reqwest::Error) -> bool {
    if error.is_request() || error.is_body() {
        return true;
    }
    let mut source = error.source();
    while let Some(cause) = source {
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return true;
        }
        source = cause.source();
    }
    false
}

#[async_trait]
impl ReviewSource for DvmnClient {
    async fn fetch(&self, cursor: Option<Timestamp>) -> PollOutcome {
        match self.request(cursor).await {
            Ok(response) => response.into_outcome(),
            Err(e) => {
                let outcome = classify_error(&e);
                debug!(outcome = outcome.kind(), error = %e, "Long-polling request failed");
                outcome
            }
        }
    }
}
