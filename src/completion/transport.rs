//! HTTP transport for the completion endpoint.

use super::{ChatRequest, CompletionError};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Raw status and body of a completion response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one chat request and hands back the raw response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<TransportResponse, CompletionError>;

    /// Endpoint this transport talks to, for display.
    fn endpoint(&self) -> &str;
}

/// Require HTTPS for remote endpoints; plain HTTP only for localhost.
pub fn validate_endpoint(endpoint: &str) -> Result<(), CompletionError> {
    let parsed = reqwest::Url::parse(endpoint)
        .map_err(|e| CompletionError::InvalidEndpoint(format!("'{}': {}", endpoint, e)))?;

    let host = parsed.host_str().unwrap_or("");
    match parsed.scheme() {
        "https" => Ok(()),
        "http" => {
            let is_localhost =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";
            if is_localhost {
                warn!(
                    "Using unencrypted HTTP for local endpoint '{}'. The API key is sent in cleartext.",
                    endpoint
                );
                Ok(())
            } else {
                Err(CompletionError::InvalidEndpoint(format!(
                    "HTTP is only allowed for localhost, use HTTPS for '{}'",
                    endpoint
                )))
            }
        }
        scheme => Err(CompletionError::InvalidEndpoint(format!(
            "unsupported scheme '{}' in '{}'",
            scheme, endpoint
        ))),
    }
}

/// reqwest-backed transport. No client-side timeout is set.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str) -> Result<Self, CompletionError> {
        validate_endpoint(endpoint)?;
        let client = Client::builder()
            .user_agent(concat!("codepad/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(
        &self,
        api_key: &str,
        request: &ChatRequest,
    ) -> Result<TransportResponse, CompletionError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        debug!(status, bytes = body.len(), "Completion endpoint responded");

        Ok(TransportResponse { status, body })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
