//! Chat endpoint.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chat_relay_common::{ChatRequest, ChatResponse};
use chrono::{SecondsFormat, Utc};

use crate::error::{Error, Result};
use crate::resolver::{self, ParameterOverrides};
use crate::AppState;

/// Build the chat router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/chat", post(chat))
}

/// POST /api/chat - one stateless completion over the caller's history.
async fn chat(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>> {
    let Json(request) = payload.map_err(|e| Error::InvalidParameter(e.body_text()))?;

    state.orchestrator.ensure_configured()?;

    let overrides = ParameterOverrides::from(&request);
    resolver::check_max_tokens(&overrides, &state.defaults, &state.catalog)?;
    let params = resolver::resolve(&overrides, &state.defaults, &state.catalog)?;

    let result = state
        .orchestrator
        .complete(&request.message, &request.history, &params)
        .await?;

    Ok(Json(ChatResponse {
        message: result.text,
        model: result.model,
        tokens_used: result.tokens_used,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}
