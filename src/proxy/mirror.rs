//! Host mirroring
//!
//! Requests arriving for a mirrored hostname are relayed verbatim to the mirror target:
//! same method, path, query, headers (minus `Host`), and body. Nothing is rewritten.

use std::sync::Arc;

use axum::body::{Body, HttpBody};
use axum::http::{header, HeaderMap, Request};
use axum::response::{IntoResponse, Response};
use tracing::{debug, error, instrument};
use url::Url;

use crate::config::HostMirror;
use crate::error::{MirageError, Result};
use crate::proxy::transform::is_hop_by_hop_header;
use crate::proxy::upstream::{ProxyRequest, UpstreamFetcher};

pub struct MirrorHandler {
    fetcher: Arc<dyn UpstreamFetcher>,
    mirrors: Vec<HostMirror>,
}

impl MirrorHandler {
    pub fn new(fetcher: Arc<dyn UpstreamFetcher>, mirrors: Vec<HostMirror>) -> Self {
        Self { fetcher, mirrors }
    }

    /// Mirror target for an inbound `Host` value, if any
    pub fn resolve(&self, host: &str) -> Option<&HostMirror> {
        let host = strip_port(host);
        self.mirrors
            .iter()
            .find(|mirror| mirror.from.eq_ignore_ascii_case(host))
    }

    /// Relay a request to `mirror.to`
    #[instrument(skip(self, req), fields(method = %req.method(), to = %mirror.to))]
    pub async fn relay(&self, mirror: &HostMirror, req: Request<Body>) -> Response {
        match self.forward(mirror, req).await {
            Ok(response) => response,
            Err(e) => {
                error!("Mirror request failed: {}", e);
                e.into_response()
            }
        }
    }

    async fn forward(&self, mirror: &HostMirror, req: Request<Body>) -> Result<Response> {
        let (parts, body) = req.into_parts();

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let url = Url::parse(&format!("https://{}{}", mirror.to, path_and_query))
            .map_err(|e| MirageError::Internal(format!("Invalid mirror URL: {}", e)))?;

        let mut headers = HeaderMap::with_capacity(parts.headers.len());
        for (name, value) in &parts.headers {
            if *name != header::HOST && !is_hop_by_hop_header(name.as_str()) {
                headers.append(name.clone(), value.clone());
            }
        }

        let body = (!body.is_end_stream()).then(|| ProxyRequest::stream_body(body));

        debug!("Relaying to {}", url);
        let upstream = self
            .fetcher
            .fetch(ProxyRequest {
                method: parts.method,
                url,
                headers,
                body,
            })
            .await?;

        let mut response = Response::new(Body::from_stream(upstream.body));
        *response.status_mut() = upstream.status;
        for (name, value) in &upstream.headers {
            if !is_hop_by_hop_header(name.as_str()) {
                response.headers_mut().append(name.clone(), value.clone());
            }
        }
        Ok(response)
    }
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // Bracketed IPv6 literal, keep the brackets
        return host.split_once(']').map_or(host, |(addr, _)| &host[..addr.len() + 1]);
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}
