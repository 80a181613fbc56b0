//! Host mirror dispatch
//!
//! Runs ahead of routing so a mirrored hostname is relayed on every path.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request};
use axum::middleware::Next;
use axum::response::Response;

use crate::server::AppState;

/// Relay requests for a mirrored host, pass everything else on
pub async fn mirror_hosts(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .or_else(|| req.uri().host());

    match host.and_then(|host| state.mirror.resolve(host)).cloned() {
        Some(mirror) => state.mirror.relay(&mirror, req).await,
        None => next.run(req).await,
    }
}
