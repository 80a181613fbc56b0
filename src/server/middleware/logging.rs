//! Request logging middleware

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use std::time::Instant;
use tracing::{debug, info};

/// Request logging middleware
pub struct RequestLogging;

impl RequestLogging {
    /// Log request details
    ///
    /// Only the path is logged; the query holds the proxied target, which the proxy
    /// handler's own span already records.
    pub async fn log_request(req: Request<Body>, next: Next) -> Response {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        let start = Instant::now();

        debug!("{} {} - started", method, path);

        let response = next.run(req).await;

        info!(
            "{} {} - {} in {:?}",
            method,
            path,
            response.status(),
            start.elapsed()
        );

        response
    }
}
