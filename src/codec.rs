//! URL rewrite codec
//!
//! Maps absolute target URLs to their proxied form (`<proxy-path>?url=<encoded>`) and back.
//! The injected client runtime applies the same rules in the browser, so any change here
//! must be mirrored in `runtime/client.js`.

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{MirageError, Result};

/// Query parameter carrying the original URL
pub const TARGET_PARAM: &str = "url";

/// Schemes that are never rewritten
pub const SKIP_SCHEMES: &[&str] = &[
    "data:",
    "mailto:",
    "javascript:",
    "about:",
    "chrome:",
    "edge:",
];

/// Prefix kept in place while the remainder of the URL is rewritten
pub const BLOB_PREFIX: &str = "blob:";

// Relative proxied forms ("/proxy?url=...") are parsed against this.
static PLACEHOLDER_ORIGIN: Lazy<Url> =
    Lazy::new(|| Url::parse("http://proxy.invalid/").expect("placeholder origin is a valid URL"));

/// Check whether a URL uses a skip-listed scheme
pub fn is_skip_listed(candidate: &str) -> bool {
    SKIP_SCHEMES
        .iter()
        .any(|scheme| starts_with_ignore_case(candidate, scheme))
}

/// Normalize the raw `url` query value into an absolute target URL.
///
/// Values without an `http://` or `https://` scheme are assumed to be `https`.
pub fn normalize_target(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(MirageError::MissingTarget);
    }

    let has_scheme =
        starts_with_ignore_case(raw, "http://") || starts_with_ignore_case(raw, "https://");
    let with_scheme = if has_scheme {
        raw.to_string()
    } else if let Some(rest) = raw.strip_prefix("//") {
        format!("https://{}", rest)
    } else {
        format!("https://{}", raw)
    };

    Url::parse(&with_scheme).map_err(|e| MirageError::InvalidTarget(e.to_string()))
}

/// Encoder/decoder bound to a proxy path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCodec {
    proxy_path: String,
    marker: String,
}

impl UrlCodec {
    pub fn new(proxy_path: impl Into<String>) -> Self {
        let proxy_path = proxy_path.into();
        let marker = format!("{}?{}=", proxy_path, TARGET_PARAM);
        Self { proxy_path, marker }
    }

    pub fn proxy_path(&self) -> &str {
        &self.proxy_path
    }

    /// The `<proxy-path>?url=` marker identifying proxied URLs
    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn is_proxied(&self, candidate: &str) -> bool {
        candidate.contains(&self.marker)
    }

    /// Proxied form of an absolute URL
    pub fn encode_absolute(&self, target: &Url) -> String {
        format!("{}{}", self.marker, urlencoding::encode(target.as_str()))
    }

    /// Rewrite `candidate`, as seen on a page whose original URL is `base`.
    ///
    /// Empty, skip-listed, and already proxied values come back unchanged. A `blob:` prefix
    /// survives and only the remainder is rewritten. Values that cannot be resolved against
    /// `base` are returned as-is instead of failing.
    pub fn encode(&self, candidate: &str, base: &Url) -> String {
        if candidate.is_empty() || is_skip_listed(candidate) {
            return candidate.to_string();
        }

        let (prefix, rest) = split_blob(candidate);
        if self.is_proxied(rest) {
            return candidate.to_string();
        }

        match base.join(rest) {
            Ok(absolute) => format!("{}{}", prefix, self.encode_absolute(&absolute)),
            Err(_) => candidate.to_string(),
        }
    }

    /// Recover the original URL from a proxied one; anything else is returned unchanged.
    pub fn decode(&self, proxied: &str) -> String {
        if !self.is_proxied(proxied) {
            return proxied.to_string();
        }

        let (prefix, rest) = split_blob(proxied);
        let parsed = Url::parse(rest).or_else(|_| PLACEHOLDER_ORIGIN.join(rest));
        let original = parsed.ok().and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == TARGET_PARAM)
                .map(|(_, value)| value.into_owned())
        });

        match original {
            Some(original) if !original.is_empty() => format!("{}{}", prefix, original),
            _ => proxied.to_string(),
        }
    }
}

impl Default for UrlCodec {
    fn default() -> Self {
        Self::new("/proxy")
    }
}

fn split_blob(candidate: &str) -> (&str, &str) {
    if starts_with_ignore_case(candidate, BLOB_PREFIX) {
        candidate.split_at(BLOB_PREFIX.len())
    } else {
        ("", candidate)
    }
}

fn starts_with_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://site.example/p/q").unwrap()
    }

    #[test]
    fn test_encode_absolute_url() {
        let codec = UrlCodec::default();
        assert_eq!(
            codec.encode("https://cdn.example/app.js?v=1", &base()),
            "/proxy?url=https%3A%2F%2Fcdn.example%2Fapp.js%3Fv%3D1"
        );
    }

    #[test]
    fn test_encode_resolves_relative_urls() {
        let codec = UrlCodec::default();
        assert_eq!(
            codec.encode("/a/b", &base()),
            "/proxy?url=https%3A%2F%2Fsite.example%2Fa%2Fb"
        );
        assert_eq!(
            codec.decode(&codec.encode("img.png", &base())),
            "https://site.example/p/img.png"
        );
        assert_eq!(
            codec.decode(&codec.encode("//other.example/x", &base())),
            "https://other.example/x"
        );
    }

    #[test]
    fn test_round_trip() {
        let codec = UrlCodec::default();
        for url in [
            "https://site.example/",
            "http://site.example:8080/a%20b/c?x=1&y=a+b#frag",
            "https://user@site.example/path/",
            "https://xn--nxasmq6b.example/%E2%82%AC",
        ] {
            assert_eq!(codec.decode(&codec.encode(url, &base())), url);
        }
    }

    #[test]
    fn test_encode_is_idempotent() {
        let codec = UrlCodec::default();
        for url in ["https://site.example/a", "/relative", "blob:https://x/y"] {
            let once = codec.encode(url, &base());
            assert_eq!(codec.encode(&once, &base()), once);
        }

        let absolute_proxy_form = "https://mirror.example/proxy?url=https%3A%2F%2Fsite.example%2F";
        assert_eq!(codec.encode(absolute_proxy_form, &base()), absolute_proxy_form);
    }

    #[test]
    fn test_skip_listed_schemes_pass_through() {
        let codec = UrlCodec::default();
        for url in [
            "data:text/plain,hi",
            "mailto:someone@site.example",
            "javascript:void(0)",
            "JavaScript:alert(1)",
            "about:blank",
            "chrome://settings",
            "edge://flags",
        ] {
            assert!(is_skip_listed(url));
            assert_eq!(codec.encode(url, &base()), url);
        }
        assert!(!is_skip_listed("https://site.example/data:"));
    }

    #[test]
    fn test_blob_prefix_is_preserved() {
        let codec = UrlCodec::default();
        let encoded = codec.encode("blob:https://x/y", &base());
        assert_eq!(encoded, "blob:/proxy?url=https%3A%2F%2Fx%2Fy");
        assert_eq!(codec.decode(&encoded), "blob:https://x/y");
    }

    #[test]
    fn test_empty_candidate_is_unchanged() {
        let codec = UrlCodec::default();
        assert_eq!(codec.encode("", &base()), "");
    }

    #[test]
    fn test_unresolvable_candidate_falls_back_to_raw() {
        let codec = UrlCodec::default();
        assert_eq!(codec.encode("http://[bad", &base()), "http://[bad");
        assert_eq!(codec.encode("blob:http://[bad", &base()), "blob:http://[bad");
    }

    #[test]
    fn test_decode_never_fails() {
        let codec = UrlCodec::default();
        assert_eq!(codec.decode("https://site.example/a"), "https://site.example/a");
        assert_eq!(codec.decode("/proxy?url="), "/proxy?url=");
        assert_eq!(codec.decode("/proxy?url=&other=1"), "/proxy?url=&other=1");
        assert_eq!(
            codec.decode("https://mirror.example/proxy?url=https%3A%2F%2Fsite.example%2Fa"),
            "https://site.example/a"
        );
    }

    #[test]
    fn test_custom_proxy_path() {
        let codec = UrlCodec::new("/go");
        assert_eq!(codec.marker(), "/go?url=");
        let encoded = codec.encode("https://site.example/", &base());
        assert_eq!(encoded, "/go?url=https%3A%2F%2Fsite.example%2F");
        assert!(!UrlCodec::default().is_proxied(&encoded));
        assert_eq!(codec.decode(&encoded), "https://site.example/");
    }

    #[test]
    fn test_normalize_target_defaults_to_https() {
        assert_eq!(
            normalize_target("example.com").unwrap().as_str(),
            "https://example.com/"
        );
        assert_eq!(
            normalize_target("//example.com/a").unwrap().as_str(),
            "https://example.com/a"
        );
        assert_eq!(
            normalize_target("http://example.com/x").unwrap().as_str(),
            "http://example.com/x"
        );
        assert_eq!(
            normalize_target("  https://example.com  ").unwrap().as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_normalize_target_errors() {
        assert!(matches!(
            normalize_target("   "),
            Err(MirageError::MissingTarget)
        ));
        assert!(matches!(
            normalize_target("http://[::1"),
            Err(MirageError::InvalidTarget(_))
        ));
    }
}
