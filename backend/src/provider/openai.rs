//! OpenAI-compatible chat completions provider.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::{CompletionProvider, CompletionRequest, CompletionResponse, Connector};
use crate::config::ProviderConfig;
use crate::error::{Error, Result, UpstreamKind};

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: &ProviderConfig, api_key: &str) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| Error::NotConfigured(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

/// Error envelope used by OpenAI-compatible APIs.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Pull the provider's own message out of an error body, falling back to the raw text.
fn provider_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => envelope.error.message,
        Err(_) if body.trim().is_empty() => "empty response body".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::upstream(UpstreamKind::Timeout, e.to_string())
    } else {
        Error::upstream(UpstreamKind::Transport, e.to_string())
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let url = format!("{}/chat/completions", self.base_url);

        tracing::debug!(
            "Sending completion request: {} model={} turns={}",
            url,
            request.model,
            request.messages.len()
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(Error::upstream(
                UpstreamKind::from_status(status.as_u16()),
                format!("{}: {}", status, provider_message(&body)),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::upstream(UpstreamKind::MalformedResponse, e.to_string()))
    }
}

/// Builds an [`OpenAiClient`] from the provider settings.
pub struct OpenAiConnector {
    settings: ProviderConfig,
}

impl OpenAiConnector {
    pub fn new(settings: ProviderConfig) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Connector for OpenAiConnector {
    fn is_configured(&self) -> bool {
        self.settings.credential().is_some()
    }

    async fn connect(&self) -> Result<Arc<dyn CompletionProvider>> {
        let api_key = self.settings.credential().ok_or_else(|| {
            Error::NotConfigured("no upstream API key is configured".to_string())
        })?;
        let client = OpenAiClient::new(&self.settings, api_key)?;
        tracing::info!("Created upstream client for {}", client.base_url);
        Ok(Arc::new(client))
    }
}
