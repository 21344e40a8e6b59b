pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod resolver;
pub mod routes;
pub mod state;
pub mod test_util;

pub use catalog::ModelCatalog;
pub use config::{Config, CorsConfig, DefaultsConfig, ProviderConfig};
pub use error::{Error, Result, UpstreamKind};
pub use orchestrator::{CompletionResult, Orchestrator};
pub use provider::{CompletionProvider, Connector, OpenAiConnector};
pub use resolver::{EffectiveParameters, ParameterOverrides, ProcessDefaults};
pub use state::AppState;

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{middleware, Router};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Build the full HTTP application.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.cors);

    Router::new()
        .merge(routes::health::router())
        .nest("/api", routes::api_router())
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS layer from `cors.origins`: `*` allows any origin, otherwise a
/// comma-separated allow list.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if config.origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .origins
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}
