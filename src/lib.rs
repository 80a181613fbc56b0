//! Mirage - Rewriting Web Proxy
//!
//! Serves arbitrary third-party pages from the proxy's own origin.
//!
//! ## Features
//!
//! - Single-parameter URL codec (`/proxy?url=<percent-encoded target>`)
//! - Response header filtering and HTML rewriting (integrity and CSP removal)
//! - Injected client runtime that routes page-initiated requests back through the proxy
//! - Verbatim host mirrors
//! - Optional upstream relay prefix and HTTP/SOCKS5 egress proxy

pub mod codec;
pub mod config;
pub mod error;
pub mod proxy;
pub mod runtime;
pub mod server;

pub use codec::UrlCodec;
pub use config::Config;
pub use error::{MirageError, Result};
pub use server::ProxyServer;
