//! Proxy server using Axum
//!
//! Binds the configured address and serves the rewriting proxy, host mirrors and the health
//! check until the shutdown channel fires.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{MirageError, Result};
use crate::proxy::{MirrorHandler, ProxyHandler, ProxyHandlerConfig, UpstreamFetcher};

use super::routes;

/// Shared state for request handlers
#[derive(Clone)]
pub struct AppState {
    pub proxy: Arc<ProxyHandler>,
    pub mirror: Arc<MirrorHandler>,
    pub started_at: Instant,
}

/// Proxy server
pub struct ProxyServer {
    config: Config,
    state: AppState,
}

impl ProxyServer {
    /// Create a new proxy server
    ///
    /// The rewriting proxy and the host mirrors share one upstream fetcher.
    pub fn new(config: Config, fetcher: Arc<dyn UpstreamFetcher>) -> Self {
        let proxy = ProxyHandler::new(
            fetcher.clone(),
            ProxyHandlerConfig::from(&config.proxy),
        );
        let mirror = MirrorHandler::new(fetcher, config.server.host_mirrors.clone());

        let state = AppState {
            proxy: Arc::new(proxy),
            mirror: Arc::new(mirror),
            started_at: Instant::now(),
        };

        Self { config, state }
    }

    /// Build the router
    pub fn build_router(&self) -> Router {
        routes::create_router(self.state.clone(), &self.config.proxy.path)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the proxy server
    #[instrument(skip(self, shutdown))]
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let addr: SocketAddr = self.config.server_addr().parse().map_err(|_| {
            MirageError::InvalidConfig(format!(
                "Invalid server address: {}",
                self.config.server_addr()
            ))
        })?;

        let router = self.build_router();

        info!(
            "Proxy server listening on {} (proxy path {})",
            addr, self.config.proxy.path
        );
        for mirror in &self.config.server.host_mirrors {
            info!("Mirroring host {} to {}", mirror.from, mirror.to);
        }

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.changed().await;
            })
            .await
            .map_err(|e| MirageError::Internal(e.to_string()))?;

        info!("Proxy server shut down");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LogConfig, ProxyConfig, ServerConfig};
    use crate::proxy::HttpFetcher;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn config(host: &str, path: &str) -> Config {
        Config {
            server: ServerConfig {
                port: 0,
                host: host.to_string(),
                host_mirrors: Vec::new(),
            },
            proxy: ProxyConfig {
                path: path.to_string(),
                ..ProxyConfig::default()
            },
            log: LogConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    fn fetcher() -> Arc<dyn UpstreamFetcher> {
        Arc::new(HttpFetcher::new(None).unwrap())
    }

    #[tokio::test]
    async fn test_router_uses_configured_proxy_path() {
        let server = ProxyServer::new(config("127.0.0.1", "/relay"), fetcher());

        let response = server
            .build_router()
            .oneshot(Request::builder().uri("/relay").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = server
            .build_router()
            .oneshot(Request::builder().uri("/proxy").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_run_rejects_invalid_address() {
        let server = ProxyServer::new(config("not an address", "/proxy"), fetcher());
        let (_tx, rx) = watch::channel(false);

        let err = server.run(rx).await.unwrap_err();
        assert!(matches!(err, MirageError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let server = ProxyServer::new(config("127.0.0.1", "/proxy"), fetcher());
        let (tx, rx) = watch::channel(false);

        let task = tokio::spawn(async move { server.run(rx).await });
        tx.send(true).unwrap();

        assert!(task.await.unwrap().is_ok());
    }
}
