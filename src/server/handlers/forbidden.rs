//! Fallback for requests outside the proxy path

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;

const FORBIDDEN_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="UTF-8">
  <title>Forbidden</title>
</head>
<body>
  Forbidden
</body>
</html>"#;

/// Static 403 page
pub async fn forbidden() -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        [(header::CONTENT_TYPE, "text/html")],
        FORBIDDEN_PAGE,
    )
}
