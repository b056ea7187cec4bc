//! Remote API error classification

use reqwest::StatusCode;
use thiserror::Error;

/// Result type for remote operations
pub type Result<T> = std::result::Result<T, RemoteError>;

#[derive(Debug, Error)]
pub enum RemoteError {
    /// 404
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// 401
    #[error("Unauthorized. Please check your API token")]
    Unauthorized,

    /// 429, surfaced after the retry budget is spent
    #[error("Rate limited by the remote API after {attempts} attempt(s)")]
    RateLimited { attempts: u32 },

    /// 5xx, surfaced after the retry budget is spent when retryable
    #[error("Remote server error (HTTP {status}) after {attempts} attempt(s): {message}")]
    ServerUnavailable {
        status: u16,
        attempts: u32,
        message: String,
    },

    /// Any other 4xx; carries the server's explanation
    #[error("Request rejected (HTTP {status}): {message}")]
    ValidationRejected { status: u16, message: String },

    /// Response body did not match the expected schema
    #[error("Failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    BuildError(String),

    /// Non-success status outside the known classes
    #[error("Unexpected response (HTTP {status}): {message}")]
    Unknown { status: u16, message: String },
}

impl RemoteError {
    /// Classifies a non-success response
    pub fn from_status(status: StatusCode, body: &str, attempts: u32) -> Self {
        let message = server_message(body);
        let code = status.as_u16();

        match status {
            StatusCode::NOT_FOUND => RemoteError::NotFound { message },
            StatusCode::UNAUTHORIZED => RemoteError::Unauthorized,
            StatusCode::TOO_MANY_REQUESTS => RemoteError::RateLimited { attempts },
            s if s.is_server_error() => RemoteError::ServerUnavailable {
                status: code,
                attempts,
                message,
            },
            s if s.is_client_error() => RemoteError::ValidationRejected {
                status: code,
                message,
            },
            _ => RemoteError::Unknown {
                status: code,
                message,
            },
        }
    }

    /// Rate limits, server errors and transient network failures
    pub fn is_retryable(&self) -> bool {
        match self {
            RemoteError::RateLimited { .. } | RemoteError::ServerUnavailable { .. } => true,
            RemoteError::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// HTTP status carried by the error, when there is one
    pub fn status(&self) -> Option<u16> {
        match self {
            RemoteError::NotFound { .. } => Some(404),
            RemoteError::Unauthorized => Some(401),
            RemoteError::RateLimited { .. } => Some(429),
            RemoteError::ServerUnavailable { status, .. }
            | RemoteError::ValidationRejected { status, .. }
            | RemoteError::Unknown { status, .. } => Some(*status),
            RemoteError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Extracts the human-readable message from an error body
///
/// The API reports errors as `{"err": "...", "ECODE": "..."}`; some
/// endpoints use `message` instead. Anything else is passed through.
fn server_message(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) {
        for key in ["err", "message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                return msg.to_string();
            }
        }
    }
    if trimmed.is_empty() {
        "no details".to_string()
    } else {
        trimmed.to_string()
    }
}
