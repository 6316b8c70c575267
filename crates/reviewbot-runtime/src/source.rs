//! Upstream side of the poller.

use async_trait::async_trait;
use reviewbot_core::{PollOutcome, Timestamp};

/// A long-polling endpoint that reports reviewed attempts.
///
/// Implementations perform exactly one request per call and classify
/// every result, including transport failures, into a `PollOutcome`.
/// `cursor` is `None` on the first request.
#[async_trait]
pub trait ReviewSource: Send + Sync {
    /// Wait for new reviews after `cursor`.
    async fn fetch(&self, cursor: Option<Timestamp>) -> PollOutcome;
}
