use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::bridge::Bridge;
use crate::core::config::BotConfig;
use crate::core::lifecycle::LifecycleManager;
use crate::core::terminal;
use crate::interfaces::discord::DiscordChannel;
use crate::interfaces::health::HealthServer;

pub(super) async fn run_bot() -> Result<()> {
    let config = Arc::new(BotConfig::from_env()?);
    crate::logging::init(config.log_level, false);

    terminal::print_banner();
    info!("[autopost] Starting v{}", env!("CARGO_PKG_VERSION"));
    config.log_summary();

    let bridge = Arc::new(Bridge::from_config(&config));
    let mut lifecycle = LifecycleManager::new();
    let shutdown = lifecycle.shutdown_token();

    lifecycle.attach(Arc::new(Mutex::new(HealthServer::new(
        config.port,
        shutdown.clone(),
    ))));
    lifecycle.attach(Arc::new(Mutex::new(DiscordChannel::new(
        config.clone(),
        bridge,
        shutdown.clone(),
    ))));

    if let Err(e) = lifecycle.start().await {
        lifecycle.shutdown().await?;
        return Err(e);
    }
    terminal::print_status("Health", &format!("http://0.0.0.0:{}/health", config.port));
    terminal::print_info("Bot running. Press Ctrl+C to stop.");

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!("[autopost] Could not listen for Ctrl+C: {}", e);
            }
            info!("[autopost] Ctrl+C received");
        }
        _ = shutdown.cancelled() => {
            warn!("[autopost] Discord connection ended, shutting down");
        }
    }

    lifecycle.shutdown().await?;
    terminal::print_goodbye();
    Ok(())
}
