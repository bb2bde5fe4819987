use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One `loc`/`msg` pair from a 422 validation body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Gateway-level error type.
/// Every failure mode of a backend call resolves to one of these; nothing panics
/// or escapes to the caller as an unclassified error.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Empty response from server")]
    EmptyResponse,

    #[error("Invalid response format (status {status})")]
    InvalidResponseFormat { status: u16 },

    /// Backend answered `success: false`.
    #[error("{0}")]
    Api(String),

    /// Backend succeeded but produced nothing usable, e.g. an empty result set.
    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limit exceeded for '{identifier}'. Please wait before trying again.")]
    RateLimitExceeded { identifier: String },

    /// Rejected before any network attempt.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl GatewayError {
    /// Stable wire code, e.g. `NETWORK_ERROR` or `HTTP_503`.
    pub fn code(&self) -> Cow<'static, str> {
        match self {
            GatewayError::EmptyResponse => Cow::Borrowed("EMPTY_RESPONSE"),
            GatewayError::InvalidResponseFormat { .. } => Cow::Borrowed("INVALID_RESPONSE_FORMAT"),
            GatewayError::Api(_) => Cow::Borrowed("API_ERROR"),
            GatewayError::Generation(_) => Cow::Borrowed("GENERATION_ERROR"),
            GatewayError::Validation { .. } => Cow::Borrowed("VALIDATION_ERROR"),
            GatewayError::Http { status, .. } => Cow::Owned(format!("HTTP_{status}")),
            GatewayError::Network(_) => Cow::Borrowed("NETWORK_ERROR"),
            GatewayError::RateLimitExceeded { .. } => Cow::Borrowed("RATE_LIMIT_EXCEEDED"),
            GatewayError::InvalidRequest(_) => Cow::Borrowed("INVALID_REQUEST"),
        }
    }

    /// Transport-level failures are worth another attempt; logical and
    /// validation failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::Http { status, .. } => {
                *status == 408 || *status == 429 || (500..600).contains(status)
            }
            _ => false,
        }
    }

    /// HTTP status behind the error, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Http { status, .. } => Some(*status),
            GatewayError::InvalidResponseFormat { status } => Some(*status),
            GatewayError::Validation { .. } => Some(422),
            _ => None,
        }
    }
}
