//! Shared application state.

use std::sync::Arc;

use crate::catalog::ModelCatalog;
use crate::config::Config;
use crate::orchestrator::Orchestrator;
use crate::provider::OpenAiConnector;
use crate::resolver::ProcessDefaults;

/// Shared application state passed to all handlers.
pub struct AppState {
    pub config: Config,
    pub catalog: ModelCatalog,
    pub defaults: ProcessDefaults,
    pub orchestrator: Orchestrator,
}

impl AppState {
    /// State talking to the configured OpenAI-compatible provider.
    pub fn new(config: Config) -> Self {
        let connector = Arc::new(OpenAiConnector::new(config.provider.clone()));
        Self::with_orchestrator(config, Orchestrator::new(connector))
    }

    pub fn with_orchestrator(config: Config, orchestrator: Orchestrator) -> Self {
        let catalog = ModelCatalog::new(config.catalog.clone(), config.provider.max_tokens_ceiling);
        let defaults = config.process_defaults();
        Self {
            config,
            catalog,
            defaults,
            orchestrator,
        }
    }
}
