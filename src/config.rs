use crate::error::{MirageError, Result};
use std::env;
use url::Url;

/// User agent presented to upstream servers unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Rewriting proxy configuration
    pub proxy: ProxyConfig,
    /// Logging configuration
    pub log: LogConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on (default: 8080)
    pub port: u16,
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Hosts relayed verbatim to another host
    pub host_mirrors: Vec<HostMirror>,
}

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    /// Path the proxy answers on and encodes into rewritten URLs (default: /proxy)
    pub path: String,
    /// User agent sent upstream
    pub user_agent: String,
    /// Optional relay URL prepended to every target
    pub upstream_prefix: Option<String>,
    /// Optional forward/egress proxy for dialing upstream servers
    /// (`http`, `https`, `socks5` or `socks5h` URL, credentials included)
    pub egress_proxy: Option<Url>,
    /// Largest HTML document buffered for rewriting
    pub max_html_bytes: usize,
}

/// A hostname whose traffic is relayed verbatim to another host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMirror {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level (debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            server: ServerConfig {
                port: get_env_or("MIRAGE_PORT", "8080").parse().map_err(|_| {
                    MirageError::InvalidConfig("MIRAGE_PORT must be a valid port number".into())
                })?,
                host: get_env_or("MIRAGE_HOST", "0.0.0.0"),
                host_mirrors: parse_host_mirrors(&get_env_or("MIRAGE_HOST_MIRRORS", ""))?,
            },
            proxy: ProxyConfig {
                path: parse_proxy_path(&get_env_or("MIRAGE_PROXY_PATH", "/proxy"))?,
                user_agent: get_env_or("MIRAGE_USER_AGENT", DEFAULT_USER_AGENT),
                upstream_prefix: parse_upstream_prefix()?,
                egress_proxy: parse_egress_proxy()?,
                max_html_bytes: get_env_or("MIRAGE_MAX_HTML_BYTES", "16777216")
                    .parse()
                    .map_err(|_| {
                        MirageError::InvalidConfig(
                            "MIRAGE_MAX_HTML_BYTES must be a valid number".into(),
                        )
                    })?,
            },
            log: LogConfig {
                level: get_env_or("LOG_LEVEL", "info"),
                format: get_env_or("LOG_FORMAT", "pretty"),
            },
        })
    }

    /// Get the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            path: "/proxy".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            upstream_prefix: None,
            egress_proxy: None,
            max_html_bytes: 16 * 1024 * 1024,
        }
    }
}

fn parse_proxy_path(raw: &str) -> Result<String> {
    let path = raw.trim();
    if !path.starts_with('/') {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_PROXY_PATH must start with '/'".into(),
        ));
    }
    if path.contains('?') || path.contains('#') {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_PROXY_PATH must not include query/fragment".into(),
        ));
    }
    Ok(path.to_string())
}

fn parse_upstream_prefix() -> Result<Option<String>> {
    let raw = env::var("MIRAGE_UPSTREAM_PREFIX").unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(raw).map_err(|e| {
        MirageError::InvalidConfig(format!("MIRAGE_UPSTREAM_PREFIX must be a valid URL: {}", e))
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_UPSTREAM_PREFIX must be an http(s) URL".into(),
        ));
    }

    Ok(Some(raw.to_string()))
}

fn parse_host_mirrors(raw: &str) -> Result<Vec<HostMirror>> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (from, to) = entry.split_once('=').ok_or_else(|| {
                MirageError::InvalidConfig(format!(
                    "MIRAGE_HOST_MIRRORS entry '{}' must look like from=to",
                    entry
                ))
            })?;
            let (from, to) = (from.trim(), to.trim());
            if from.is_empty() || to.is_empty() {
                return Err(MirageError::InvalidConfig(format!(
                    "MIRAGE_HOST_MIRRORS entry '{}' has an empty host",
                    entry
                )));
            }
            Ok(HostMirror {
                from: from.to_ascii_lowercase(),
                to: to.to_string(),
            })
        })
        .collect()
}

fn parse_egress_proxy() -> Result<Option<Url>> {
    let raw = env::var("MIRAGE_EGRESS_PROXY").unwrap_or_default();
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }

    let url = Url::parse(raw).map_err(|e| {
        MirageError::InvalidConfig(format!("MIRAGE_EGRESS_PROXY must be a valid URL: {}", e))
    })?;

    if !matches!(url.scheme(), "http" | "https" | "socks5" | "socks5h") {
        return Err(MirageError::InvalidConfig(format!(
            "MIRAGE_EGRESS_PROXY has unsupported scheme: {}",
            url.scheme()
        )));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_EGRESS_PROXY must include a host".into(),
        ));
    }
    // Reject URLs that carry request-specific components.
    if url.fragment().is_some() || url.query().is_some() {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_EGRESS_PROXY must not include query/fragment".into(),
        ));
    }
    if !(url.path().is_empty() || url.path() == "/") {
        return Err(MirageError::InvalidConfig(
            "MIRAGE_EGRESS_PROXY must not include a path".into(),
        ));
    }

    Ok(Some(url))
}

/// Get environment variable with a default value
fn get_env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
