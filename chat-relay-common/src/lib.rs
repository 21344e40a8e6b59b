//! chat-relay common types
//!
//! Shared between the backend service and its clients/tests.

pub mod api;
pub mod chat;

pub use api::{ChatRequest, ChatResponse, HealthResponse, ModelEntry, ModelsResponse};
pub use chat::{HistoryEntry, Role, Turn, TurnError};
