//! Request gateway: the single point of entry for every backend call.
//!
//! No other module talks to the transport directly. Every call resolves to an
//! `ApiResult`: `Ok(Envelope)` or `Err(Failure)` with a classified error code.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

pub mod classify;
pub mod envelope;
pub mod rate_limiter;
pub mod retry;
pub mod transport;

use crate::gateway::classify::{classify_failure, classify_response, classify_transport_error};
use crate::gateway::envelope::{ApiResult, Envelope, Failure, Metadata};
use crate::gateway::transport::Transport;

/// Issues one logical call to the backend and classifies the outcome.
#[derive(Clone)]
pub struct RequestGateway {
    transport: Arc<dyn Transport>,
}

impl RequestGateway {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// POSTs `payload` to `endpoint` once. Never retries, never panics.
    pub async fn request(&self, endpoint: &str, payload: &Value) -> ApiResult<Value> {
        debug!("request → {endpoint}");

        let raw = match self.transport.post(endpoint, payload).await {
            Ok(raw) => raw,
            Err(e) => {
                let error = classify_transport_error(&e);
                warn!(endpoint, code = %error.code(), "transport failure: {e}");
                return Err(Failure::new(error, endpoint));
            }
        };

        if raw.status >= 400 {
            let error = classify_failure(raw.status, &raw.body);
            warn!(endpoint, status = raw.status, code = %error.code(), "request failed: {error}");
            return Err(Failure::new(error, endpoint));
        }

        match classify_response(raw.status, &raw.body) {
            Ok(classified) => {
                let mut metadata = Metadata::now(endpoint);
                if let Some(warning) = &classified.warning {
                    warn!(endpoint, "{warning}");
                }
                metadata.warning = classified.warning;
                metadata.backend = classified.backend_metadata;
                info!(endpoint, status = raw.status, "request succeeded");
                Ok(Envelope {
                    data: classified.data,
                    metadata,
                })
            }
            Err(error) => {
                warn!(endpoint, status = raw.status, code = %error.code(), "unusable response: {error}");
                Err(Failure::new(error, endpoint))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::transport::scripted::ScriptedTransport;
    use serde_json::json;

    fn gateway(transport: ScriptedTransport) -> (RequestGateway, Arc<ScriptedTransport>) {
        let transport = Arc::new(transport);
        (RequestGateway::new(transport.clone()), transport)
    }

    #[tokio::test]
    async fn test_unwrapped_body_is_success() {
        let (gw, _) = gateway(ScriptedTransport::new().respond(200, r#"{"foo": 1}"#));
        let envelope = gw.request("content/generate", &json!({})).await.unwrap();
        assert_eq!(envelope.data, json!({"foo": 1}));
        assert_eq!(envelope.metadata.endpoint, "content/generate");
    }

    #[tokio::test]
    async fn test_wrapped_body_unwraps_data() {
        let (gw, transport) = gateway(
            ScriptedTransport::new().respond_json(200, json!({"success": true, "data": {"id": "c1"}})),
        );
        let envelope = gw
            .request("course/generate", &json!({"topic": "rust"}))
            .await
            .unwrap();
        assert_eq!(envelope.data["id"], "c1");
        assert_eq!(transport.calls()[0].1["topic"], "rust");
    }

    #[tokio::test]
    async fn test_missing_data_surfaces_warning_metadata() {
        let (gw, _) = gateway(ScriptedTransport::new().respond(200, r#"{"success": true}"#));
        let envelope = gw.request("feedback", &json!({})).await.unwrap();
        assert_eq!(envelope.data, json!({}));
        assert!(envelope.metadata.warning.is_some());
    }

    #[tokio::test]
    async fn test_422_is_validation_failure() {
        let (gw, _) = gateway(ScriptedTransport::new().respond(
            422,
            r#"{"detail": [{"loc": ["topic"], "msg": "required"}]}"#,
        ));
        let failure = gw.request("course/generate", &json!({})).await.unwrap_err();
        assert_eq!(failure.code(), "VALIDATION_ERROR");
        assert!(failure.message().contains("topic: required"));
    }

    #[tokio::test]
    async fn test_server_error_is_http_code() {
        let (gw, _) = gateway(ScriptedTransport::new().respond(502, "Bad Gateway"));
        let failure = gw.request("chat", &json!({})).await.unwrap_err();
        assert_eq!(failure.code(), "HTTP_502");
    }

    #[tokio::test]
    async fn test_transport_error_is_network_error() {
        let (gw, _) = gateway(ScriptedTransport::new().fail("connection refused"));
        let failure = gw.request("chat", &json!({})).await.unwrap_err();
        assert_eq!(failure.code(), "NETWORK_ERROR");
        assert!(failure.message().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_backend_logical_failure_is_api_error() {
        let (gw, _) = gateway(
            ScriptedTransport::new().respond(200, r#"{"success": false, "error": "No modules"}"#),
        );
        let failure = gw.request("course/generate", &json!({})).await.unwrap_err();
        assert_eq!(failure.code(), "API_ERROR");
        assert_eq!(failure.message(), "No modules");
    }
}
