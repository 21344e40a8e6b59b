//! Static model catalog.

use chat_relay_common::ModelEntry;

/// Models advertised by `/api/models`, also the source of per-model
/// output-token ceilings.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelEntry>,
    fallback_ceiling: u32,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelEntry>, fallback_ceiling: u32) -> Self {
        Self {
            models,
            fallback_ceiling,
        }
    }

    pub fn models(&self) -> &[ModelEntry] {
        &self.models
    }

    pub fn get(&self, model_id: &str) -> Option<&ModelEntry> {
        self.models.iter().find(|m| m.id == model_id)
    }

    /// Largest `max_tokens` the provider accepts for `model_id`.
    pub fn ceiling_for(&self, model_id: &str) -> u32 {
        self.get(model_id)
            .map(|m| m.max_tokens)
            .unwrap_or(self.fallback_ceiling)
    }
}
