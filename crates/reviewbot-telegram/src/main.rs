//! Review notification bot binary.
//!
//! Start the bot with:
//! ```bash
//! DEVMAN_API_TOKEN=xxx TELEGRAM_BOT_TOKEN=yyy TELEGRAM_CHAT_ID=123 cargo run -p reviewbot-telegram
//! ```
//!
//! Log verbosity follows `RUST_LOG`.

use std::sync::Arc;

use reviewbot_core::{Alert, RelayConfig};
use reviewbot_runtime::{AlertSink, DvmnClient, PollerConfig, ReviewPoller};
use reviewbot_telegram::{TelegramAlertSink, TelegramChat};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str =
    "reviewbot=info,reviewbot_runtime=info,reviewbot_telegram=info,teloxide=warn";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; the variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = RelayConfig::from_env()?;
    info!(api_url = %config.api_url, chat = %config.chat_id, "Configuration loaded");

    let chat = Arc::new(TelegramChat::from_config(&config)?);
    match chat.get_me().await {
        Ok(username) => info!(username = %username, "Bot initialized successfully"),
        Err(e) => {
            error!(error = %e, "Failed to get bot info");
            return Err(e.into());
        }
    }

    let alerts = Arc::new(TelegramAlertSink::new(Arc::clone(&chat)));
    let source = Arc::new(DvmnClient::from_config(&config)?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl+C received, shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Keep the sender alive; dropping it would stop the poller.
                warn!(error = %e, "Cannot listen for Ctrl+C, stop the process to exit");
                std::future::pending::<()>().await;
            }
        }
    });

    alerts.alert(Alert::info("Bot started")).await;

    let mut poller = ReviewPoller::new(source, chat, alerts, PollerConfig::from(&config));
    poller.run(shutdown_rx).await;

    info!("Bot stopped");
    Ok(())
}
