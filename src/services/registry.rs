//! Explicitly owned registry of trained forecast models.
//!
//! The registry is constructed once and passed into the services that need
//! it; nothing here is process-global, so tests can substitute fixtures
//! freely. Models are read-only after install and shared behind `Arc`: a
//! retrain swaps the slot's `Arc` while in-flight predictions keep using the
//! model they already resolved.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::models::{ForecastModel, ModelKey};

#[derive(Debug, Default)]
pub struct ModelRegistry {
    slots: RwLock<HashMap<ModelKey, Arc<ForecastModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a model into its slot, atomically replacing any prior model.
    pub fn install(&self, model: ForecastModel) -> Arc<ForecastModel> {
        let model = Arc::new(model);
        self.slots.write().insert(model.key, Arc::clone(&model));
        model
    }

    /// Resolve the model for a (target, horizon) pair.
    pub fn get(&self, key: ModelKey) -> Option<Arc<ForecastModel>> {
        self.slots.read().get(&key).cloned()
    }

    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().is_empty()
    }

    pub fn keys(&self) -> Vec<ModelKey> {
        let mut keys: Vec<ModelKey> = self.slots.read().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Verify every expected slot is filled.
    ///
    /// Run at load time so missing (target, horizon) combinations surface
    /// before serving rather than at first request.
    pub fn validate_complete(
        &self,
        expected: impl IntoIterator<Item = ModelKey>,
    ) -> Result<(), Vec<ModelKey>> {
        let slots = self.slots.read();
        let missing: Vec<ModelKey> = expected
            .into_iter()
            .filter(|key| !slots.contains_key(key))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}
