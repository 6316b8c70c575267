//! Startup configuration.
//!
//! Settings are read once from the process environment. The binary loads a
//! `.env` file first, so either source works.

use std::fmt;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::{CoreError, Result};

/// Environment variable holding the review service token.
pub const API_TOKEN_ENV: &str = "DEVMAN_API_TOKEN";

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the destination chat.
pub const CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

/// Environment variable overriding the long-polling endpoint.
pub const API_URL_ENV: &str = "DEVMAN_API_URL";

/// Environment variable overriding the long-poll window, in seconds.
pub const POLL_TIMEOUT_ENV: &str = "DEVMAN_POLL_TIMEOUT_SECS";

/// Environment variable overriding the first retry delay, in seconds.
pub const RETRY_INITIAL_ENV: &str = "RETRY_INITIAL_DELAY_SECS";

/// Environment variable overriding the retry delay increment, in seconds.
pub const RETRY_STEP_ENV: &str = "RETRY_DELAY_STEP_SECS";

/// Environment variable capping the retry delay, in seconds.
pub const RETRY_MAX_ENV: &str = "RETRY_MAX_DELAY_SECS";

/// Default long-polling endpoint.
pub const DEFAULT_API_URL: &str = "https://dvmn.org/api/long_polling/";

/// Default long-poll window.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(100);

/// Linear retry delay settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffSettings {
    /// Delay before the first retry, and the value restored after a success.
    pub initial: Duration,
    /// Amount added after every consecutive failure.
    pub step: Duration,
    /// Upper bound; `None` lets the delay grow without limit.
    pub max: Option<Duration>,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            step: Duration::from_secs(10),
            max: None,
        }
    }
}

impl BackoffSettings {
    /// The delay that follows `current` after another failure.
    pub fn next_delay(&self, current: Duration) -> Duration {
        let grown = current.saturating_add(self.step);
        match self.max {
            Some(max) => grown.min(max),
            None => grown,
        }
    }
}

/// Everything the bot needs to run.
#[derive(Clone)]
pub struct RelayConfig {
    /// Review service API token.
    pub api_token: String,
    /// Telegram bot token.
    pub bot_token: String,
    /// Destination chat: numeric id or `@channel` username.
    pub chat_id: String,
    /// Long-polling endpoint.
    pub api_url: Url,
    /// How long the service may hold a request open.
    pub poll_timeout: Duration,
    /// Retry delay policy.
    pub backoff: BackoffSettings,
}

impl RelayConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| -> Result<String> {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(CoreError::MissingVar(name))
        };
        let seconds = |name: &'static str| -> Result<Option<Duration>> {
            match lookup(name).map(|v| v.trim().to_string()) {
                None => Ok(None),
                Some(v) if v.is_empty() => Ok(None),
                Some(v) => v
                    .parse::<u64>()
                    .map(|secs| Some(Duration::from_secs(secs)))
                    .map_err(|e| CoreError::InvalidVar {
                        name,
                        reason: format!("expected whole seconds, got {:?}: {}", v, e),
                    }),
            }
        };

        let api_url = match lookup(API_URL_ENV).filter(|v| !v.trim().is_empty()) {
            Some(raw) => Url::parse(raw.trim()).map_err(|e| CoreError::InvalidVar {
                name: API_URL_ENV,
                reason: e.to_string(),
            })?,
            None => Url::parse(DEFAULT_API_URL).map_err(|e| CoreError::InvalidVar {
                name: API_URL_ENV,
                reason: e.to_string(),
            })?,
        };

        let poll_timeout = seconds(POLL_TIMEOUT_ENV)?.unwrap_or(DEFAULT_POLL_TIMEOUT);
        if poll_timeout.is_zero() {
            return Err(CoreError::InvalidVar {
                name: POLL_TIMEOUT_ENV,
                reason: "must be greater than zero".to_string(),
            });
        }

        let defaults = BackoffSettings::default();
        let backoff = BackoffSettings {
            initial: seconds(RETRY_INITIAL_ENV)?.unwrap_or(defaults.initial),
            step: seconds(RETRY_STEP_ENV)?.unwrap_or(defaults.step),
            max: seconds(RETRY_MAX_ENV)?,
        };

        let config = Self {
            api_token: required(API_TOKEN_ENV)?,
            bot_token: required(BOT_TOKEN_ENV)?,
            chat_id: required(CHAT_ID_ENV)?,
            api_url,
            poll_timeout,
            backoff,
        };

        debug!(config = ?config, "Loaded configuration");
        Ok(config)
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_token", &"<redacted>")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("api_url", &self.api_url.as_str())
            .field("poll_timeout", &self.poll_timeout)
            .field("backoff", &self.backoff)
            .finish()
    }
}
