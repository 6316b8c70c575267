//! Telegram delivery for the review notification bot.
//!
//! Review notifications and operational alerts go to the same chat:
//! - `TelegramChat` sends HTML-formatted review notifications
//! - `TelegramAlertSink` sends plain-text alerts and never fails
//!
//! # Environment Variables
//!
//! Required:
//! - `TELEGRAM_BOT_TOKEN`: Bot token from @BotFather
//! - `TELEGRAM_CHAT_ID`: Numeric chat id or `@channel` username
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use reviewbot_core::{Alert, RelayConfig};
//! use reviewbot_runtime::AlertSink;
//! use reviewbot_telegram::{TelegramAlertSink, TelegramChat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!     let chat = Arc::new(TelegramChat::from_config(&config)?);
//!     let alerts = TelegramAlertSink::new(Arc::clone(&chat));
//!
//!     alerts.alert(Alert::info("Bot started")).await;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod sink;

pub use error::{Result, TelegramError};
pub use sink::{parse_recipient, truncate_message, TelegramAlertSink, TelegramChat};
