//! Response rewriting
//!
//! Header filtering for every proxied response, plus the text transforms applied to HTML
//! documents before they reach the browser.

use http::header::{self, HeaderMap};
use once_cell::sync::Lazy;
use regex::Regex;

/// Headers that would break embedding or leak cookies to the proxy origin
pub const STRIPPED_HEADERS: &[&str] = &[
    "set-cookie",
    "content-security-policy",
    "content-security-policy-report-only",
    "x-frame-options",
];

static INTEGRITY_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)\sintegrity\s*=\s*["'][^"']*["']"#).expect("Invalid integrity pattern")
});

static CSP_META_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<meta[^>]*http-equiv\s*=\s*["']Content-Security-Policy["'][^>]*>"#)
        .expect("Invalid CSP meta pattern")
});

static BODY_OPEN_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<body(\s[^>]*)?>").expect("Invalid body tag pattern"));

/// Copy upstream headers, dropping the stripped set and hop-by-hop headers
pub fn filter_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(upstream.len());
    for (name, value) in upstream {
        if STRIPPED_HEADERS.contains(&name.as_str()) || is_hop_by_hop_header(name.as_str()) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}

/// Check whether the response is an HTML document
pub fn is_html(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.to_ascii_lowercase().contains("text/html"))
}

/// Apply the HTML transforms in order: strip integrity attributes, strip CSP meta tags,
/// inject `script`.
pub fn rewrite_html(html: &str, script: &str) -> String {
    let html = strip_integrity(html);
    let html = strip_csp_meta(&html);
    inject_script(&html, script)
}

/// Remove subresource-integrity attributes; hashes no longer match proxied content
pub fn strip_integrity(html: &str) -> String {
    INTEGRITY_ATTRIBUTE.replace_all(html, "").into_owned()
}

/// Remove `<meta http-equiv="Content-Security-Policy">` tags
pub fn strip_csp_meta(html: &str) -> String {
    CSP_META_TAG.replace_all(html, "").into_owned()
}

/// Insert `script` before the first `</head>`, else after the opening `<body>` tag, else at
/// the start of the document.
pub fn inject_script(html: &str, script: &str) -> String {
    let at = if let Some(head_end) = html.to_ascii_lowercase().find("</head>") {
        head_end
    } else if let Some(body_open) = BODY_OPEN_TAG.find(html) {
        body_open.end()
    } else {
        0
    };

    let mut out = String::with_capacity(html.len() + script.len());
    out.push_str(&html[..at]);
    out.push_str(script);
    out.push_str(&html[at..]);
    out
}

/// Check if a header is a hop-by-hop header that should not be forwarded
pub fn is_hop_by_hop_header(name: &str) -> bool {
    matches!(
        name.to_lowercase().as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}
