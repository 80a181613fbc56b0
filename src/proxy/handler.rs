//! Rewriting proxy handler
//!
//! Fetches the page named by the `url` query parameter and returns it with unsafe headers
//! removed. HTML documents are rewritten and carry the client runtime; everything else is
//! streamed through untouched.

use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tracing::{debug, error, info, instrument, warn};
use url::{form_urlencoded, Url};

use crate::codec::{normalize_target, TARGET_PARAM};
use crate::config::ProxyConfig;
use crate::error::{MirageError, Result};
use crate::proxy::transform;
use crate::proxy::upstream::{ProxyRequest, UpstreamFetcher};
use crate::runtime;

/// Configuration for the proxy handler
#[derive(Debug, Clone)]
pub struct ProxyHandlerConfig {
    /// User agent sent upstream
    pub user_agent: String,
    /// Optional relay URL prepended to every target
    pub upstream_prefix: Option<String>,
    /// Largest HTML document buffered for rewriting
    pub max_html_bytes: usize,
}

impl From<&ProxyConfig> for ProxyHandlerConfig {
    fn from(config: &ProxyConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            upstream_prefix: config.upstream_prefix.clone(),
            max_html_bytes: config.max_html_bytes,
        }
    }
}

impl Default for ProxyHandlerConfig {
    fn default() -> Self {
        Self::from(&ProxyConfig::default())
    }
}

/// Proxy request handler
pub struct ProxyHandler {
    fetcher: Arc<dyn UpstreamFetcher>,
    config: ProxyHandlerConfig,
}

impl ProxyHandler {
    pub fn new(fetcher: Arc<dyn UpstreamFetcher>, config: ProxyHandlerConfig) -> Self {
        Self { fetcher, config }
    }

    /// Handle an incoming proxy request.
    ///
    /// Never fails: every error is turned into a 400 or 500 response here.
    #[instrument(skip(self, req), fields(method = %req.method(), uri = %req.uri()))]
    pub async fn handle(&self, req: Request<Body>) -> Response {
        let start = Instant::now();

        match self.proxy(req).await {
            Ok(response) => {
                info!(
                    status = response.status().as_u16(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Proxied request"
                );
                response
            }
            Err(e) if e.is_client_error() => {
                warn!("Rejected proxy request: {}", e);
                e.into_response()
            }
            Err(e) => {
                error!("Proxy request failed: {}", e);
                e.into_response()
            }
        }
    }

    async fn proxy(&self, req: Request<Body>) -> Result<Response> {
        let target = target_from_query(req.uri().query())?;

        let (parts, body) = req.into_parts();
        let body = forwards_body(&parts.method).then(|| ProxyRequest::stream_body(body));

        let request = ProxyRequest {
            method: parts.method,
            url: self.upstream_url(&target)?,
            headers: self.upstream_headers()?,
            body,
        };
        debug!("Fetching {} for {}", request.url, target);

        let upstream = self.fetcher.fetch(request).await?;
        let status = upstream.status;
        let mut headers = transform::filter_response_headers(&upstream.headers);

        if !transform::is_html(&headers) {
            return Ok(build_response(status, headers, Body::from_stream(upstream.body)));
        }

        let raw = upstream.collect_body(self.config.max_html_bytes).await?;
        let html = String::from_utf8_lossy(&raw);
        let rewritten = transform::rewrite_html(&html, runtime::client_runtime());

        headers.remove(header::CONTENT_LENGTH);
        Ok(build_response(status, headers, Body::from(Bytes::from(rewritten))))
    }

    /// Target URL with the optional relay prefix applied
    fn upstream_url(&self, target: &Url) -> Result<Url> {
        let Some(prefix) = &self.config.upstream_prefix else {
            return Ok(target.clone());
        };

        let relayed = format!("{}{}", prefix, target);
        Url::parse(&relayed)
            .map_err(|e| MirageError::Internal(format!("Invalid relay URL '{}': {}", relayed, e)))
    }

    fn upstream_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(
            header::USER_AGENT,
            HeaderValue::from_str(&self.config.user_agent)
                .map_err(|e| MirageError::Internal(format!("Invalid user agent: {}", e)))?,
        );
        Ok(headers)
    }
}

/// Extract and normalize the `url` query parameter
pub fn target_from_query(query: Option<&str>) -> Result<Url> {
    let raw = query
        .and_then(|query| {
            form_urlencoded::parse(query.as_bytes())
                .find(|(key, _)| key == TARGET_PARAM)
                .map(|(_, value)| value.into_owned())
        })
        .filter(|value| !value.is_empty())
        .ok_or(MirageError::MissingTarget)?;

    normalize_target(&raw)
}

/// Only POST and PUT bodies are forwarded upstream
fn forwards_body(method: &Method) -> bool {
    *method == Method::POST || *method == Method::PUT
}

fn build_response(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
