//! Turns a raw backend exchange into either usable data or a classified error.
//!
//! The backend does not wrap every endpoint in `{success, data, error}`, so a
//! 2xx body without a `success` flag is accepted as the data itself.

use reqwest::StatusCode;
use serde_json::{Map, Value};

use crate::errors::{FieldError, GatewayError};
use crate::gateway::transport::TransportError;

pub const MISSING_DATA_WARNING: &str = "Response marked successful but contained no data";

/// Successful classification of a response body.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified {
    pub data: Value,
    pub warning: Option<String>,
    pub backend_metadata: Option<Value>,
}

fn is_success_status(status: u16) -> bool {
    (200..300).contains(&status)
}

fn parse_body(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Classifies a response that arrived with a non-error status.
///
/// 1. empty body → `EMPTY_RESPONSE`
/// 2. no boolean `success` → whole body is the data on 2xx, else `INVALID_RESPONSE_FORMAT`
/// 3. `success: false` → `API_ERROR` with the backend message
/// 4. `success: true` without `data` → `{}` plus a warning
/// 5. otherwise → `data`
pub fn classify_response(status: u16, body: &str) -> Result<Classified, GatewayError> {
    if body.trim().is_empty() {
        return Err(GatewayError::EmptyResponse);
    }

    let parsed = parse_body(body);
    if parsed.is_null() {
        return Err(GatewayError::EmptyResponse);
    }

    let success = parsed.get("success").and_then(Value::as_bool);
    let Some(success) = success else {
        if is_success_status(status) {
            return Ok(Classified {
                data: parsed,
                warning: None,
                backend_metadata: None,
            });
        }
        return Err(GatewayError::InvalidResponseFormat { status });
    };

    if !success {
        let message = parsed
            .get("error")
            .and_then(error_text)
            .unwrap_or_else(|| "Unknown API error".to_string());
        return Err(GatewayError::Api(message));
    }

    let backend_metadata = parsed.get("metadata").filter(|m| !m.is_null()).cloned();
    match parsed.get("data") {
        Some(data) if !data.is_null() => Ok(Classified {
            data: data.clone(),
            warning: None,
            backend_metadata,
        }),
        _ => Ok(Classified {
            data: Value::Object(Map::new()),
            warning: Some(MISSING_DATA_WARNING.to_string()),
            backend_metadata,
        }),
    }
}

/// Classifies a response whose status is 400 or above.
pub fn classify_failure(status: u16, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<Value>(body).ok();

    if status == 422 {
        let fields = parsed
            .as_ref()
            .and_then(|v| v.get("detail"))
            .map(field_errors)
            .unwrap_or_default();

        let message = if !fields.is_empty() {
            fields
                .iter()
                .map(|f| format!("{}: {}", f.field, f.message))
                .collect::<Vec<_>>()
                .join("; ")
        } else {
            parsed
                .as_ref()
                .and_then(backend_message)
                .unwrap_or_else(|| "Validation failed".to_string())
        };
        return GatewayError::Validation { message, fields };
    }

    let message = parsed
        .as_ref()
        .and_then(backend_message)
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty() && trimmed.len() <= 200 && parsed.is_none())
                .then(|| trimmed.to_string())
        })
        .or_else(|| {
            StatusCode::from_u16(status)
                .ok()
                .and_then(|s| s.canonical_reason())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    GatewayError::Http { status, message }
}

/// A transport error carries no status, so it is always a network error.
pub fn classify_transport_error(err: &TransportError) -> GatewayError {
    GatewayError::Network(err.to_string())
}

/// Extracts `loc`/`msg` pairs from a FastAPI-style `detail` array.
fn field_errors(detail: &Value) -> Vec<FieldError> {
    let Some(items) = detail.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let message = item.get("msg").and_then(Value::as_str)?.to_string();
            let field = item
                .get("loc")
                .and_then(Value::as_array)
                .map(|loc| {
                    loc.iter()
                        .map(|part| match part {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(".")
                })
                .unwrap_or_else(|| "request".to_string());
            Some(FieldError { field, message })
        })
        .collect()
}

fn backend_message(body: &Value) -> Option<String> {
    ["error", "detail", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(error_text))
}

fn error_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
