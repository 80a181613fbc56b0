//! Mirage Proxy Server - Entry Point
//!
//! Starts the rewriting proxy with graceful shutdown support.

use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mirage::config::{Config, LogConfig};
use mirage::proxy::{HttpFetcher, UpstreamFetcher};
use mirage::ProxyServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    init_tracing(&config.log);

    info!("Starting Mirage Proxy Server");

    let fetcher: Arc<dyn UpstreamFetcher> = Arc::new(
        HttpFetcher::new(config.proxy.egress_proxy.as_ref())
            .context("Failed to build upstream client")?,
    );
    if let Some(prefix) = &config.proxy.upstream_prefix {
        info!("Upstream requests relayed through {}", prefix);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = ProxyServer::new(config, fetcher);

    let server_task = tokio::spawn(async move {
        if let Err(e) = server.run(shutdown_rx).await {
            error!("Proxy server error: {}", e);
        }
    });

    // Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = server_task.await;

    info!("Mirage Proxy Server stopped");
    Ok(())
}

/// Install the global subscriber; `RUST_LOG` overrides `LOG_LEVEL` when set
fn init_tracing(log: &LogConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mirage={},tower_http=info", log.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if log.format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
