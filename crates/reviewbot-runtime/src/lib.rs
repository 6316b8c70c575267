//! Long-polling runtime for the review notification bot.
//!
//! This crate drives the polling loop:
//! - `ReviewSource` - issues one long-polling request and classifies the result
//! - `DvmnClient` - the reqwest-backed `ReviewSource`
//! - `ChatSink` / `AlertSink` - outbound delivery of notifications and alerts
//! - `ReviewPoller` - owns the cursor and retry delay and runs the loop
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use reviewbot_core::{Alert, RelayConfig};
//! use reviewbot_runtime::{AlertSink, ChatSink, DvmnClient, PollerConfig, ReviewPoller};
//! use tokio::sync::watch;
//!
//! struct StdoutChat;
//!
//! #[async_trait]
//! impl ChatSink for StdoutChat {
//!     async fn send_html(&self, text: &str) -> reviewbot_runtime::Result<()> {
//!         println!("{}", text);
//!         Ok(())
//!     }
//! }
//!
//! struct StderrAlerts;
//!
//! #[async_trait]
//! impl AlertSink for StderrAlerts {
//!     async fn alert(&self, alert: Alert) {
//!         eprintln!("{}", alert.render());
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RelayConfig::from_env()?;
//!     let source = Arc::new(DvmnClient::from_config(&config)?);
//!     let mut poller = ReviewPoller::new(
//!         source,
//!         Arc::new(StdoutChat),
//!         Arc::new(StderrAlerts),
//!         PollerConfig::from(&config),
//!     );
//!
//!     let (shutdown_tx, shutdown_rx) = watch::channel(false);
//!     tokio::spawn(async move {
//!         let _ = tokio::signal::ctrl_c().await;
//!         let _ = shutdown_tx.send(true);
//!     });
//!
//!     poller.run(shutdown_rx).await;
//!     Ok(())
//! }
//! ```
//!
//! # Failure handling
//!
//! Nothing escapes `ReviewPoller::run`. Transport timeouts are the normal
//! "nothing new" signal and are retried at once. Connection failures and
//! unexpected errors sleep for the current retry delay, which then grows
//! linearly until the next successful request resets it. Unexpected errors
//! are also reported through the `AlertSink`.

pub mod client;
pub mod config;
pub mod error;
pub mod poller;
pub mod sink;
pub mod source;
pub mod state;

pub use client::DvmnClient;
pub use config::PollerConfig;
pub use error::{Result, RuntimeError};
pub use poller::{CycleReport, ReviewPoller};
pub use sink::{AlertSink, ChatSink};
pub use source::ReviewSource;
pub use state::PollState;
