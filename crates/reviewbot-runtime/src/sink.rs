//! Outbound side of the poller: review notifications and operational alerts.

use async_trait::async_trait;
use reviewbot_core::Alert;

use crate::error::Result;

/// Destination for review notifications.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send an HTML-formatted message.
    async fn send_html(&self, text: &str) -> Result<()>;
}

/// Destination for operational alerts.
///
/// Delivery is best effort. Implementations must swallow their own
/// failures so that reporting an error can never raise another one.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Deliver an alert.
    async fn alert(&self, alert: Alert);
}
