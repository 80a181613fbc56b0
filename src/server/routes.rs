//! Route definitions

use axum::middleware;
use axum::routing::{any, get};
use axum::Router;

use super::handlers;
use super::middleware::{mirror_hosts, RequestLogging};
use super::server::AppState;

/// Create the router with all routes
///
/// Host mirrors are checked before any route; everything outside the proxy path and the
/// health check gets the forbidden page.
pub fn create_router(state: AppState, proxy_path: &str) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(proxy_path, any(handlers::proxy::proxy))
        .fallback(handlers::forbidden::forbidden)
        .layer(middleware::from_fn(RequestLogging::log_request))
        .layer(middleware::from_fn_with_state(state.clone(), mirror_hosts))
        .with_state(state)
}
