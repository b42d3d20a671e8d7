//! Error types for the language model client.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur when talking to the language model service.
#[derive(Debug, Error)]
pub enum LlmError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The model service returned an error.
    #[error("API error ({error_type}): {message}")]
    Api {
        /// Error type from the API.
        error_type: String,
        /// Error message.
        message: String,
    },

    /// Rate limited by the API.
    #[error("rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// Authentication failed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The call did not complete in time.
    #[error("model call timed out after {0:?}")]
    Timeout(Duration),

    /// The model replied in a way the protocol does not allow.
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl LlmError {
    /// Whether retrying the same request could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited(_) | Self::Timeout(_) => true,
            Self::Api { error_type, .. } => error_type == "server_error",
            Self::Unauthorized(_) | Self::Parse(_) | Self::Protocol(_) => false,
        }
    }
}

/// API error response body.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// Error type.
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    /// Error message.
    pub message: String,
}
