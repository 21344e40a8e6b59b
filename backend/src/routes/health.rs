use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use chat_relay_common::HealthResponse;

use crate::AppState;

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.orchestrator.is_configured()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health))
}
