//! Error types for the console client.

use crate::keys::FormErrors;
use reqwest::StatusCode;
use thiserror::Error;

/// Result type for console operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Console client errors.
///
/// Every gateway failure ends up here, whatever its origin. Callers that only
/// need success/failure can match on `Err(_)`.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failed (connection refused, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-2xx status. `message` is the `error`
    /// field of the reply body, when it had one.
    #[error("Response status {code}, {text}{}", with_message(.message))]
    Status {
        code: u16,
        text: String,
        message: Option<String>,
    },

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server embedded an `error` field in an otherwise successful response.
    #[error("Server error: {0}")]
    Server(String),

    /// Origin or command produced an unparsable URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Remember-me storage could not be read or written.
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Form input was rejected before any request was made.
    #[error("Validation failed: {0}")]
    Validation(FormErrors),

    /// Operation needs an authenticated session.
    #[error("Not authenticated")]
    NotAuthenticated,
}

impl Error {
    /// Build a status error from a response status.
    pub fn status(status: StatusCode) -> Self {
        Self::Status {
            code: status.as_u16(),
            text: status.canonical_reason().unwrap_or_default().to_string(),
            message: None,
        }
    }

    /// Build a status error, keeping the server's `error` text from `body`.
    pub fn status_with_body(status: StatusCode, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| match v.get("error") {
                Some(serde_json::Value::String(msg)) => Some(msg.clone()),
                Some(serde_json::Value::Null) | None => None,
                Some(other) => Some(other.to_string()),
            });
        match Self::status(status) {
            Self::Status { code, text, .. } => Self::Status { code, text, message },
            other => other,
        }
    }

    /// Human-readable reason the server gave, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            Self::Server(msg) => Some(msg),
            _ => None,
        }
    }

    /// True for failures raised below the application layer.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. } | Self::Json(_))
    }

    /// Status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { code, .. } => Some(*code),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn with_message(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default()
}
