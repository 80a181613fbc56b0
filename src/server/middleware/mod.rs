//! HTTP middleware

mod logging;
mod mirror;

pub use logging::RequestLogging;
pub use mirror::mirror_hosts;
