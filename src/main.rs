mod action;
mod bots;
mod config;
mod error;
mod media;
mod platform;
mod registry;
mod router;
mod server;
mod storage;
mod update;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::bots::unreal4u::Unreal4uBot;
use crate::bots::uptime_monitor::UptimeMonitorBot;
use crate::config::Config;
use crate::media::MediaArchive;
use crate::platform::telegram::TelegramApi;
use crate::registry::BotRegistry;
use crate::router::RequestRouter;
use crate::storage::blacklist::BlacklistStore;
use crate::storage::monitor::MonitorStore;
use crate::storage::Database;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,botgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    let registry = BotRegistry::from_config(&config.bots);
    info!("Configuration loaded successfully");
    info!("  Bots: {}", registry.len());
    info!("  Monitor bot: {}", config.monitor.bot_name);
    info!("  Media: {}", config.media.directory.display());

    let database = Database::open(&config.storage.database_path)?;
    let transport = Arc::new(TelegramApi::new(
        &config.telegram.api_url,
        BlacklistStore::new(database.connection()),
    ));

    let router = RequestRouter::new(
        registry,
        transport,
        Unreal4uBot::new(MediaArchive::new(
            config.media.directory.clone(),
            &config.media.base_url,
        )),
        UptimeMonitorBot::new(
            MonitorStore::new(database.connection()),
            &config.server.public_url,
            &config.monitor.bot_name,
        ),
        &config.monitor.bot_name,
        &config.server.fallback_url,
    );

    server::serve(&config.server.listen, Arc::new(router)).await?;

    Ok(())
}
