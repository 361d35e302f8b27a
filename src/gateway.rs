//! HTTP Gateway
//!
//! Thin fetch seam over reqwest. Discovery and telemetry go through the
//! [`Gateway`] trait so they can be driven against scripted fakes in tests.

use async_trait::async_trait;
use thiserror::Error;

/// Plain GET access to remote JSON documents.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch a URL and return the response body of a 2xx response.
    async fn get_text(&self, url: &str) -> Result<String, GatewayError>;
}

/// Production gateway backed by a shared reqwest client.
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    /// Create a gateway with the given per-request timeout.
    pub fn new(request_timeout_ms: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn get_text(&self, url: &str) -> Result<String, GatewayError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else if e.is_connect() {
                GatewayError::Unreachable
            } else {
                GatewayError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        response.text().await.map_err(GatewayError::Request)
    }
}

/// Errors that can occur when fetching a remote document
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("endpoint unreachable")]
    Unreachable,

    #[error("request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}
