//! Client interception runtime
//!
//! The script injected into every proxied HTML page. It is rendered once from
//! `client.js` and the hook table in [`hooks`], then shared by every response.

pub mod hooks;

pub use hooks::{is_url_attribute, CallHook, CallKind, PropertyHook};

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::codec::{BLOB_PREFIX, SKIP_SCHEMES, TARGET_PARAM};

const TEMPLATE: &str = include_str!("client.js");
const CONFIG_PLACEHOLDER: &str = "__MIRAGE_RUNTIME_CONFIG__";

/// Window property marking a page on which the runtime is already installed
pub const STATE_KEY: &str = "__mirageInterception";

static CLIENT_RUNTIME: Lazy<String> = Lazy::new(|| render(&RuntimeConfig::default()));

/// Everything the script needs to know, serialized as one JSON literal
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    pub state_key: &'static str,
    pub param: &'static str,
    pub blob_prefix: &'static str,
    pub skip_schemes: &'static [&'static str],
    pub url_attributes: &'static [&'static str],
    pub observed_attributes: &'static [&'static str],
    pub call_hooks: &'static [CallHook],
    pub property_hooks: &'static [PropertyHook],
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            state_key: STATE_KEY,
            param: TARGET_PARAM,
            blob_prefix: BLOB_PREFIX,
            skip_schemes: SKIP_SCHEMES,
            url_attributes: hooks::URL_ATTRIBUTES,
            observed_attributes: hooks::OBSERVED_ATTRIBUTES,
            call_hooks: hooks::CALL_HOOKS,
            property_hooks: hooks::PROPERTY_HOOKS,
        }
    }
}

/// The `<script>` block injected into proxied HTML
pub fn client_runtime() -> &'static str {
    &CLIENT_RUNTIME
}

/// Render the runtime for a given hook configuration
pub fn render(config: &RuntimeConfig) -> String {
    // Only static strings and integers go in, so serialization cannot fail.
    let config_json = serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string());
    format!(
        "<script>\n{}</script>\n",
        TEMPLATE.replace(CONFIG_PLACEHOLDER, &config_json)
    )
}
