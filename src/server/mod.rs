//! HTTP server
//!
//! Routes inbound requests to the rewriting proxy, host mirrors, the health check, or the
//! forbidden page.

pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;

pub use server::{AppState, ProxyServer};
