//! Static model catalog endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chat_relay_common::ModelsResponse;

use crate::AppState;

/// GET /api/models - List the models callers may request.
async fn list_models(State(state): State<Arc<AppState>>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        models: state.catalog.models().to_vec(),
        default_model: state.defaults.model.clone(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/models", get(list_models))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{test_config, test_state, FakeConnector, FakeReply};

    #[tokio::test]
    async fn test_list_models_uses_catalog_and_default() {
        let mut config = test_config();
        config.defaults.model = "gpt-4".to_string();
        let connector = Arc::new(FakeConnector::replying(FakeReply::text("unused", None)));
        let state = test_state(config, connector.clone());

        let Json(response) = list_models(State(state)).await;
        assert_eq!(response.default_model, "gpt-4");
        assert_eq!(response.models.len(), 3);
        assert!(response.models.iter().any(|m| m.id == "gpt-4" && m.max_tokens == 8192));
        assert_eq!(connector.calls(), 0);
    }
}
