//! Transport seam between the gateway and the backend.
//!
//! `HttpTransport` is the production implementation. The gateway only ever sees
//! a status code and a body, so classification stays testable without a network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Whatever the backend sent back, before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// The request never produced an HTTP status (DNS, connect, reset, timeout).
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<RawResponse, TransportError>;
}

/// JSON-over-HTTP POST transport backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpTransport {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into(),
            api_key: api_key.into(),
        })
    }

    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            endpoint.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, endpoint: &str, payload: &Value) -> Result<RawResponse, TransportError> {
        let url = self.url_for(endpoint);
        debug!("POST {url}");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TransportError(format!("request to {endpoint} timed out"))
                } else {
                    TransportError(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError(format!("failed to read response body: {e}")))?;

        Ok(RawResponse { status, body })
    }
}

/// Scripted in-memory transport for tests.
#[cfg(test)]
pub mod scripted {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    /// Replays queued outcomes in order and records every call.
    #[derive(Default)]
    pub struct ScriptedTransport {
        outcomes: Mutex<VecDeque<Result<RawResponse, TransportError>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: impl Into<String>) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .push_back(Ok(RawResponse::new(status, body)));
            self
        }

        pub fn respond_json(self, status: u16, body: Value) -> Self {
            self.respond(status, body.to_string())
        }

        pub fn fail(self, message: &str) -> Self {
            self.outcomes
                .lock()
                .unwrap()
                .push_back(Err(TransportError(message.to_string())));
            self
        }

        pub fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(
            &self,
            endpoint: &str,
            payload: &Value,
        ) -> Result<RawResponse, TransportError> {
            self.calls
                .lock()
                .unwrap()
                .push((endpoint.to_string(), payload.clone()));
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError("no scripted response left".to_string())))
        }
    }
}
