pub mod chat;
pub mod health;
pub mod models;

use std::sync::Arc;

use axum::Router;

use crate::AppState;

/// Routes mounted under `/api`.
pub fn api_router() -> Router<Arc<AppState>> {
    Router::new().merge(chat::router()).merge(models::router())
}
