mod bootstrap;
mod catalog;
mod health;
mod products;

use std::time::Duration;

use anyhow::Result;
use stockroom_core::config::{AppConfig, LoadOptions};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use stockroom_core::config::LogFormat::*;

    // RUST_LOG, when set, refines the configured level.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.to_ascii_lowercase()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Load config and initialize logging before any other operations
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    let router = app.router();

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.changed().await;
            })
            .await
    });

    info!(
        event_name = "system.server.started",
        bind_address = %address,
        "stockroom-server started"
    );

    tokio::select! {
        joined = &mut server => {
            joined??;
            return Ok(());
        }
        signal = tokio::signal::ctrl_c() => signal?,
    }

    info!(event_name = "system.server.stopping", "stockroom-server stopping");
    let _ = shutdown_tx.send(true);

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            grace_secs = grace.as_secs(),
            "in-flight requests did not drain before the shutdown deadline"
        ),
    }

    app.db_pool.close().await;
    Ok(())
}
