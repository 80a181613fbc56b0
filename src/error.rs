use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Unified error type for the Mirage proxy
#[derive(Error, Debug)]
pub enum MirageError {
    // Input errors
    #[error("Query parameter 'url' is missing.")]
    MissingTarget,

    #[error("Query parameter 'url' is invalid: {0}")]
    InvalidTarget(String),

    // Upstream errors (fetch-level failures only, never HTTP statuses)
    #[error("{0}")]
    Upstream(String),

    // Rewrite errors
    #[error("{0}")]
    Transform(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Mirage operations
pub type Result<T> = std::result::Result<T, MirageError>;

impl MirageError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            MirageError::MissingTarget | MirageError::InvalidTarget(_) => StatusCode::BAD_REQUEST,

            // 500 Internal Server Error
            MirageError::Upstream(_)
            | MirageError::Transform(_)
            | MirageError::InvalidConfig(_)
            | MirageError::Io(_)
            | MirageError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Plain-text body sent to the browser for this error
    pub fn body(&self) -> String {
        if self.is_client_error() {
            self.to_string()
        } else {
            format!("Proxy Error: {}", self)
        }
    }
}

impl IntoResponse for MirageError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.body(),
        )
            .into_response()
    }
}

impl From<reqwest::Error> for MirageError {
    fn from(err: reqwest::Error) -> Self {
        MirageError::Upstream(err.to_string())
    }
}
