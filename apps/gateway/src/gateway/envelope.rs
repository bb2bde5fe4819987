use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::errors::GatewayError;

/// Context attached to every gateway outcome, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    /// Non-fatal oddity in an otherwise successful response.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    /// `metadata` object sent by the backend, passed through untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<Value>,
}

impl Metadata {
    pub fn now(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            timestamp: Utc::now(),
            warning: None,
            backend: None,
        }
    }
}

/// Success variant: the payload plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope<T> {
    pub data: T,
    pub metadata: Metadata,
}

impl<T> Envelope<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Envelope<U> {
        Envelope {
            data: f(self.data),
            metadata: self.metadata,
        }
    }
}

/// Failure variant: a classified error plus metadata.
#[derive(Debug, Clone, Error)]
#[error("{error}")]
pub struct Failure {
    #[source]
    pub error: GatewayError,
    pub metadata: Metadata,
}

impl Failure {
    pub fn new(error: GatewayError, endpoint: &str) -> Self {
        Self {
            error,
            metadata: Metadata::now(endpoint),
        }
    }

    pub fn code(&self) -> String {
        self.error.code().into_owned()
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// `{success: false, error: {message, code, metadata}}`, ready for a UI layer.
    pub fn body(&self) -> Value {
        let mut error = json!({
            "message": self.message(),
            "code": self.code(),
            "metadata": self.metadata,
        });
        if let GatewayError::Validation { fields, .. } = &self.error {
            error["fields"] = json!(fields);
        }
        json!({ "success": false, "error": error })
    }
}

/// Outcome of one logical backend call. Never panics, never escapes as anything else.
pub type ApiResult<T> = Result<Envelope<T>, Failure>;
