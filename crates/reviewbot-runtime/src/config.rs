//! Poller configuration.

use std::time::Duration;

use reviewbot_core::{BackoffSettings, RelayConfig};

/// Configuration for the polling loop.
#[derive(Debug, Clone, Default)]
pub struct PollerConfig {
    /// Retry delay policy applied after failed cycles.
    pub backoff: BackoffSettings,
}

impl PollerConfig {
    /// Creates a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay used after the first failure.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.backoff.initial = delay;
        self
    }

    /// Sets the amount the delay grows by after each further failure.
    pub fn with_delay_step(mut self, step: Duration) -> Self {
        self.backoff.step = step;
        self
    }

    /// Caps the retry delay.
    pub fn with_max_delay(mut self, max: Duration) -> Self {
        self.backoff.max = Some(max);
        self
    }
}

impl From<&RelayConfig> for PollerConfig {
    fn from(config: &RelayConfig) -> Self {
        Self {
            backoff: config.backoff,
        }
    }
}
