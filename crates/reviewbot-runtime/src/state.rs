//! Mutable state carried between polling cycles.

use std::time::Duration;

use reviewbot_core::{BackoffSettings, Timestamp};
use tracing::debug;

/// Resumption cursor and retry delay owned by the poller.
#[derive(Debug, Clone, PartialEq)]
pub struct PollState {
    cursor: Option<Timestamp>,
    backoff_delay: Duration,
    consecutive_failures: u32,
}

impl PollState {
    /// Fresh state: no cursor yet, delay at its initial value.
    pub fn new(initial_delay: Duration) -> Self {
        Self {
            cursor: None,
            backoff_delay: initial_delay,
            consecutive_failures: 0,
        }
    }

    /// Cursor to send with the next request, if any.
    pub fn cursor(&self) -> Option<Timestamp> {
        self.cursor
    }

    /// Delay that the next failure will sleep for.
    pub fn backoff_delay(&self) -> Duration {
        self.backoff_delay
    }

    /// Failures since the last successful cycle.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Adopt a server-issued cursor.
    ///
    /// The cursor never moves backwards; an older value is ignored.
    /// Returns whether the cursor changed.
    pub fn advance(&mut self, next: Timestamp) -> bool {
        match self.cursor {
            Some(current) if next < current => {
                debug!(current = %current, offered = %next, "Ignoring cursor older than the current one");
                false
            }
            Some(current) if next == current => false,
            _ => {
                self.cursor = Some(next);
                true
            }
        }
    }

    /// Reset the retry delay after a successful cycle.
    pub fn record_success(&mut self, backoff: &BackoffSettings) {
        self.backoff_delay = backoff.initial;
        self.consecutive_failures = 0;
    }

    /// Register a failed cycle.
    ///
    /// Returns the delay to sleep before retrying and grows the stored delay
    /// for the failure after it.
    pub fn record_failure(&mut self, backoff: &BackoffSettings) -> Duration {
        let delay = self.backoff_delay;
        self.backoff_delay = backoff.next_delay(delay);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        delay
    }
}
