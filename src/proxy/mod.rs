//! Proxy implementation
//!
//! This module provides the request-side machinery:
//! - Upstream fetching behind a pluggable trait
//! - Response header filtering and HTML rewriting
//! - The rewriting proxy handler
//! - Verbatim host mirroring

pub mod handler;
pub mod mirror;
pub mod transform;
pub mod upstream;

pub use handler::{ProxyHandler, ProxyHandlerConfig};
pub use mirror::MirrorHandler;
pub use upstream::{HttpFetcher, ProxyRequest, UpstreamFetcher, UpstreamResponse};
