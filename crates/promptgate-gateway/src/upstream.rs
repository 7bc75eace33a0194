//! Upstream caller
//!
//! Forwards an approved request to the external model endpoint and
//! returns its raw response body or a typed failure. No retries at this
//! layer; retry policy, if any, belongs to the caller.

use promptgate_core::{ChatMessage, Error, Result};
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

/// Request body for `POST {base}/v1/chat/completions`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatRequest {
    /// Build a request carrying a single user message
    pub fn single_user(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: None,
        }
    }
}

/// HTTP client for the upstream chat completions endpoint
pub struct UpstreamClient {
    endpoint: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl UpstreamClient {
    /// Create a client for the given base URL
    pub fn new(base_url: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::internal(format!("failed to build http client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/v1/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            http,
        })
    }

    /// Send a chat request, returning the raw JSON body.
    ///
    /// A non-success status becomes [`Error::Upstream`] with the status
    /// and body propagated; a transport failure (connection refused,
    /// timeout, DNS) becomes [`Error::UpstreamUnreachable`]. The
    /// `auth` value, when present, takes precedence over the configured
    /// API key.
    pub async fn send(
        &self,
        request: &ChatRequest,
        auth: Option<&str>,
    ) -> Result<serde_json::Value> {
        debug!(model = %request.model, "forwarding request upstream");

        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(auth) = auth {
            builder = builder.header("Authorization", auth);
        } else if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::UpstreamUnreachable(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::UpstreamUnreachable(e.to_string()))?;

        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::internal(format!("upstream returned malformed json: {}", e)))
    }
}
