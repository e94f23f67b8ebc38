mod bot;
mod config;
mod webhook;

use std::sync::Arc;

use anyhow::Result;
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,username_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Nothing touches the network until the configuration is valid
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    info!("Configuration loaded successfully");
    info!("  Port: {}", config.port);
    info!("  Base URL: {}", config.base_url);
    info!("  Reply: {}", config.target_username);

    let bot = Bot::new(&config.token);
    let config = Arc::new(config);

    info!("Bot is starting...");
    if let Err(e) = webhook::run(bot, config).await {
        error!("Bot stopped: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
