//! Upstream completion provider.
//!
//! `CompletionProvider` is the single outbound call the service makes.
//! `Connector` builds the provider handle; the orchestrator calls it at most
//! once per process.

mod openai;

pub use openai::{OpenAiClient, OpenAiConnector};

use std::sync::Arc;

use async_trait::async_trait;
use chat_relay_common::Turn;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Body of the upstream "create completion" call.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<Turn>,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// Decoded upstream reply. Extraction of the answer is left to the caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
    #[serde(default)]
    pub usage: Option<CompletionUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionChoice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionUsage {
    #[serde(default)]
    pub total_tokens: Option<u32>,
}

impl CompletionResponse {
    /// Reply with a single choice, as most providers return it.
    pub fn single(content: impl Into<String>, total_tokens: Option<u32>) -> Self {
        Self {
            model: None,
            choices: vec![CompletionChoice {
                message: ChoiceMessage {
                    content: Some(content.into()),
                },
            }],
            usage: total_tokens.map(|total| CompletionUsage {
                total_tokens: Some(total),
            }),
        }
    }
}

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Issue one completion request. No retries.
    async fn create_completion(&self, request: &CompletionRequest) -> Result<CompletionResponse>;
}

#[async_trait]
pub trait Connector: Send + Sync {
    /// Whether a usable credential is available. Must not do I/O.
    fn is_configured(&self) -> bool;

    /// Build the provider handle. Fails with `NotConfigured` without a credential.
    async fn connect(&self) -> Result<Arc<dyn CompletionProvider>>;
}
