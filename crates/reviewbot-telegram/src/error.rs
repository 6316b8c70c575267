//! Error types for the Telegram crate.

use thiserror::Error;

/// Errors that can occur in the Telegram layer.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// `TELEGRAM_CHAT_ID` is neither a number nor an `@channel` name.
    #[error("Invalid chat id {0:?}: expected a numeric id or @channel username")]
    InvalidChatId(String),

    /// The bot could not be initialized.
    #[error("Failed to start bot: {0}")]
    BotStartFailed(String),

    /// A message could not be sent.
    #[error("Failed to send message: {0}")]
    SendFailed(String),
}

/// Result type for Telegram operations.
pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<teloxide::RequestError> for TelegramError {
    fn from(e: teloxide::RequestError) -> Self {
        TelegramError::SendFailed(e.to_string())
    }
}
