use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use teloxide::prelude::*;
use teloxide::update_listeners::webhooks::{self, Options};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::bot;
use crate::config::Config;

pub fn webhook_options(config: &Config) -> Options {
    let mut options = Options::new(config.listen_addr(), config.webhook_url.clone());
    // Served path is always `/<token>`, whatever path the base URL carries.
    options.path = config.webhook_path();
    options
}

pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind webhook listener on {}", addr))
}

/// Bind, register the webhook with Telegram, then serve updates until the
/// process is terminated.
pub async fn run(bot: Bot, config: Arc<Config>) -> Result<()> {
    let addr = config.listen_addr();
    let tcp_listener = bind(addr).await?;
    info!("Listening on {}", addr);

    serve(bot, config, tcp_listener).await
}

/// Register the webhook and serve it on an already bound listener. Returns an
/// error if the HTTP server stops while the dispatcher is still running.
pub async fn serve(bot: Bot, config: Arc<Config>, tcp_listener: TcpListener) -> Result<()> {
    let (listener, stop_flag, router) =
        webhooks::axum_to_router(bot.clone(), webhook_options(&config))
            .await
            .context("Failed to register webhook with Telegram")?;
    info!("Webhook registered at {}/<token>", config.base_url);

    let server = tokio::spawn(async move {
        axum::serve(tcp_listener, router)
            .with_graceful_shutdown(stop_flag)
            .await
    });

    supervise(server, bot::dispatch(bot, config, listener)).await
}

/// Wait on the dispatcher, failing as soon as the HTTP server task ends
/// underneath it.
async fn supervise<D>(mut server: JoinHandle<io::Result<()>>, dispatcher: D) -> Result<()>
where
    D: Future<Output = ()>,
{
    tokio::select! {
        joined = &mut server => {
            joined
                .context("Webhook server task panicked")?
                .context("Webhook server failed")?;
            bail!("Webhook server stopped while the dispatcher was running");
        }
        () = dispatcher => {}
    }

    server
        .await
        .context("Webhook server task panicked")?
        .context("Webhook server failed")?;
    Ok(())
}
