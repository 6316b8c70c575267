//! Chat and alert sinks backed by the Telegram Bot API.

use std::sync::Arc;

use async_trait::async_trait;
use reviewbot_core::{Alert, RelayConfig};
use reviewbot_runtime::{AlertSink, ChatSink, RuntimeError};
use teloxide::prelude::*;
use teloxide::types::{ParseMode, Recipient};
use tracing::{debug, warn};

use crate::error::{Result, TelegramError};

/// Telegram's limit for a single text message, in characters.
const MAX_MESSAGE_CHARS: usize = 4096;

/// Marker appended to truncated messages.
const TRUNCATION_MARKER: &str = "\n…(truncated)";

/// Parse a chat identifier: a numeric id or an `@channel` username.
pub fn parse_recipient(raw: &str) -> Result<Recipient> {
    let raw = raw.trim();
    if raw.starts_with('@') && raw.len() > 1 {
        return Ok(Recipient::ChannelUsername(raw.to_string()));
    }
    raw.parse::<i64>()
        .map(|id| Recipient::Id(ChatId(id)))
        .map_err(|_| TelegramError::InvalidChatId(raw.to_string()))
}

/// Cut a message down to what Telegram accepts.
pub fn truncate_message(text: &str) -> String {
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text.to_string();
    }
    let keep = MAX_MESSAGE_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = text.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Sends messages to one Telegram chat.
#[derive(Clone)]
pub struct TelegramChat {
    bot: Bot,
    recipient: Recipient,
}

impl TelegramChat {
    /// Create a chat handle for an existing bot.
    pub fn new(bot: Bot, recipient: Recipient) -> Self {
        Self { bot, recipient }
    }

    /// Create a chat handle from the loaded configuration.
    pub fn from_config(config: &RelayConfig) -> Result<Self> {
        let recipient = parse_recipient(&config.chat_id)?;
        Ok(Self::new(Bot::new(config.bot_token.clone()), recipient))
    }

    /// Get the bot's username.
    pub async fn get_me(&self) -> Result<String> {
        let me = self
            .bot
            .get_me()
            .await
            .map_err(|e| TelegramError::BotStartFailed(e.to_string()))?;
        Ok(me.username().to_string())
    }

    /// Send a message without markup.
    pub async fn send_plain(&self, text: &str) -> Result<()> {
        self.bot
            .send_message(self.recipient.clone(), truncate_message(text))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl ChatSink for TelegramChat {
    async fn send_html(&self, text: &str) -> reviewbot_runtime::Result<()> {
        self.bot
            .send_message(self.recipient.clone(), text)
            .parse_mode(ParseMode::Html)
            .await
            .map_err(|e| RuntimeError::Delivery(e.to_string()))?;
        debug!(recipient = ?self.recipient, "Message delivered");
        Ok(())
    }
}

/// Forwards operational alerts to the notification chat as plain text.
pub struct TelegramAlertSink {
    chat: Arc<TelegramChat>,
}

impl TelegramAlertSink {
    /// Create a sink that reuses the notification chat.
    pub fn new(chat: Arc<TelegramChat>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl AlertSink for TelegramAlertSink {
    async fn alert(&self, alert: Alert) {
        if let Err(e) = self.chat.send_plain(&alert.render()).await {
            warn!(
                severity = %alert.severity,
                message = %alert.message,
                error = %e,
                "Failed to deliver alert"
            );
        }
    }
}
