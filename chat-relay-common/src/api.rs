//! HTTP contract of the chat-relay service.

use serde::{Deserialize, Serialize};

use crate::chat::HistoryEntry;

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            history: Vec::new(),
            model: None,
            temperature: None,
            max_tokens: None,
        }
    }
}

/// Reply of `POST /api/chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub model: String,
    pub tokens_used: u32,
    /// RFC 3339 UTC timestamp of when the reply was produced.
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub max_tokens: u32,
}

/// Reply of `GET /api/models`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsResponse {
    pub models: Vec<ModelEntry>,
    pub default_model: String,
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub configured: bool,
}

impl HealthResponse {
    pub fn healthy(configured: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            configured,
        }
    }
}
