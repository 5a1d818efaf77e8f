mod bootstrap;
mod health;
mod refresh;
mod routes;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dewy_core::config::{AppConfig, LoadOptions, LoggingConfig};
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

fn init_logging(config: &LoggingConfig) {
    use dewy_core::config::LogFormat::*;

    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));

    match config.format {
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
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config.logging);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let refresher = refresh::spawn(
        Arc::clone(&app.observations),
        Arc::clone(&app.segments),
        app.config.price_segments.clone(),
    );

    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "dewy-server started"
    );

    let shutdown = Arc::new(Notify::new());
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    let server = axum::serve(listener, app.router())
        .with_graceful_shutdown(wait_for_shutdown(Arc::clone(&shutdown)))
        .into_future();

    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.notified().await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(
                event_name = "system.server.shutdown_timeout",
                correlation_id = "shutdown",
                grace_secs = grace.as_secs(),
                "in-flight requests did not drain before the shutdown deadline"
            );
        }
    }

    refresher.abort();
    app.db_pool.close().await;
    tracing::info!(event_name = "system.server.stopped", correlation_id = "shutdown", "dewy-server stopped");

    Ok(())
}

async fn wait_for_shutdown(shutdown: Arc<Notify>) {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(
            event_name = "system.server.signal_error",
            correlation_id = "shutdown",
            error = %error,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    tracing::info!(event_name = "system.server.stopping", correlation_id = "shutdown", "dewy-server stopping");
    shutdown.notify_one();
}
