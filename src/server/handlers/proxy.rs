//! Rewriting proxy endpoint

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::response::Response;

use crate::server::AppState;

/// Serve a third-party page through the proxy
pub async fn proxy(State(state): State<AppState>, req: Request<Body>) -> Response {
    state.proxy.handle(req).await
}
