//! Completion orchestration: validate, assemble the conversation, make the
//! single upstream call and extract the reply.

use std::sync::Arc;

use chat_relay_common::{HistoryEntry, Turn, TurnError};
use tokio::sync::OnceCell;

use crate::error::{Error, Result, UpstreamKind};
use crate::provider::{CompletionProvider, CompletionRequest, CompletionResponse, Connector};
use crate::resolver::{self, EffectiveParameters};

/// Maximum length of the user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4000;

/// Persona prompt placed at the start of every conversation.
pub const SYSTEM_PROMPT: &str = "You are a helpful, friendly assistant. \
Answer clearly and concisely, and say so when you are not sure about something.";

/// Outcome of one successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    pub text: String,
    pub tokens_used: u32,
    /// Model reported by the provider, or the requested one if it reported none.
    pub model: String,
}

/// Owns the upstream client handle and runs completions against it.
pub struct Orchestrator {
    connector: Arc<dyn Connector>,
    client: OnceCell<Arc<dyn CompletionProvider>>,
}

impl Orchestrator {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            client: OnceCell::new(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.connector.is_configured()
    }

    /// Run one completion.
    ///
    /// Input is fully validated before the provider is contacted; exactly one
    /// upstream request is made on the success path.
    pub async fn complete(
        &self,
        message: &str,
        history: &[HistoryEntry],
        params: &EffectiveParameters,
    ) -> Result<CompletionResult> {
        self.ensure_configured()?;
        validate_message(message)?;
        validate_params(params)?;
        let messages = assemble_turns(message, history)?;

        let client = self.client().await?;

        let request = CompletionRequest {
            model: params.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        tracing::debug!(
            model = %request.model,
            turns = request.messages.len(),
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "Dispatching completion"
        );

        let response = client.create_completion(&request).await?;
        let result = extract(response, &params.model)?;

        tracing::info!(
            model = %result.model,
            tokens_used = result.tokens_used,
            "Completion finished"
        );

        Ok(result)
    }

    pub fn ensure_configured(&self) -> Result<()> {
        if self.connector.is_configured() {
            Ok(())
        } else {
            Err(Error::NotConfigured(
                "no upstream API key is configured".to_string(),
            ))
        }
    }

    /// Shared client, built on first use. Concurrent first callers wait on the
    /// same initialization; a failed attempt leaves the cell empty.
    async fn client(&self) -> Result<&Arc<dyn CompletionProvider>> {
        self.client
            .get_or_try_init(|| async { self.connector.connect().await })
            .await
    }
}

fn validate_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::InvalidParameter("message must not be empty".to_string()));
    }
    let len = message.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(Error::InvalidParameter(format!(
            "message must be at most {} characters, got {}",
            MAX_MESSAGE_CHARS, len
        )));
    }
    Ok(())
}

/// Parameters may be built by hand, so the resolver's checks are repeated here.
fn validate_params(params: &EffectiveParameters) -> Result<()> {
    resolver::check_temperature(params.temperature)?;
    if params.max_tokens == 0 {
        return Err(Error::InvalidParameter("max_tokens must be at least 1".to_string()));
    }
    if params.model.trim().is_empty() {
        return Err(Error::InvalidParameter("model must not be empty".to_string()));
    }
    Ok(())
}

/// Build `[system, ..history, user(message)]`, failing on the first invalid
/// history entry.
pub fn assemble_turns(message: &str, history: &[HistoryEntry]) -> Result<Vec<Turn>> {
    let mut turns = Vec::with_capacity(history.len() + 2);
    turns.push(Turn::system(SYSTEM_PROMPT).map_err(invalid_turn)?);

    for (index, entry) in history.iter().enumerate() {
        let turn = Turn::try_from(entry).map_err(|e| {
            Error::InvalidParameter(format!("history[{}]: {}", index, e))
        })?;
        turns.push(turn);
    }

    turns.push(Turn::user(message).map_err(invalid_turn)?);
    Ok(turns)
}

fn invalid_turn(e: TurnError) -> Error {
    Error::InvalidParameter(e.to_string())
}

fn extract(response: CompletionResponse, requested_model: &str) -> Result<CompletionResult> {
    let tokens_used = response
        .usage
        .as_ref()
        .and_then(|u| u.total_tokens)
        .unwrap_or(0);

    let text = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| {
            Error::upstream(UpstreamKind::MalformedResponse, "response contained no choices")
        })?
        .message
        .content
        .ok_or_else(|| {
            Error::upstream(UpstreamKind::MalformedResponse, "first choice has no content")
        })?;

    Ok(CompletionResult {
        text,
        tokens_used,
        model: response
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| requested_model.to_string()),
    })
}
