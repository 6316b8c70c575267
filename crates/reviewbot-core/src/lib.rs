//! Core types for the review notification bot.
//!
//! This crate holds everything that does not touch the network:
//! - `ReviewAttempt`, `Timestamp` and `PollOutcome` - the polling data model
//! - `LongPollResponse` - the wire shape returned by the review service
//! - `format_attempt` - renders a reviewed attempt as a chat message
//! - `Alert` - operational events routed to the alert channel
//! - `RelayConfig` - settings loaded once at startup
//!
//! # Environment Variables
//!
//! Required:
//! - `DEVMAN_API_TOKEN`: Token for the review service API
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TELEGRAM_CHAT_ID`: Chat that receives notifications and alerts
//!
//! Optional:
//! - `DEVMAN_API_URL`: Long-polling endpoint (default: https://dvmn.org/api/long_polling/)
//! - `DEVMAN_POLL_TIMEOUT_SECS`: Long-poll window (default: 100)
//! - `RETRY_INITIAL_DELAY_SECS`: First retry delay (default: 1)
//! - `RETRY_DELAY_STEP_SECS`: Delay added after each failure (default: 10)
//! - `RETRY_MAX_DELAY_SECS`: Upper bound for the retry delay (default: none)

pub mod alert;
pub mod config;
pub mod error;
pub mod format;
pub mod models;

pub use alert::{Alert, Severity};
pub use config::{BackoffSettings, RelayConfig};
pub use error::{CoreError, Result};
pub use format::{format_attempt, APPROVED_VERDICT, NEGATIVE_VERDICT};
pub use models::{LongPollResponse, PollOutcome, ReviewAttempt, Timestamp};
