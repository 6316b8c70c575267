//! Operational alerts delivered to the chat alongside review notifications.

use std::fmt;

use chrono::{DateTime, Utc};

/// Name shown in rendered alerts.
const ALERT_SOURCE: &str = "reviewbot";

/// Alert severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// An operational event, as opposed to a review notification.
#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    /// When the event happened.
    pub at: DateTime<Utc>,
    /// How serious it is.
    pub severity: Severity,
    /// One-line summary.
    pub message: String,
    /// Optional error detail.
    pub detail: Option<String>,
}

impl Alert {
    /// Create an alert stamped with the current time.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            at: Utc::now(),
            severity,
            message: message.into(),
            detail: None,
        }
    }

    /// Informational alert.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    /// Error alert.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Attach error detail.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Plain-text rendering: `time - source - LEVEL - message`, detail below.
    pub fn render(&self) -> String {
        let mut text = format!(
            "{} - {} - {} - {}",
            self.at.format("%Y-%m-%d %H:%M:%S"),
            ALERT_SOURCE,
            self.severity,
            self.message
        );
        if let Some(detail) = &self.detail {
            text.push('\n');
            text.push_str(detail);
        }
        text
    }
}
