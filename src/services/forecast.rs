//! Forecast pipeline: orchestrates feature building and model inference.

use std::sync::Arc;

use crate::config::ForecastSettings;
use crate::models::{
    ForecastModel, Horizon, ModelKey, PredictionBatch, PredictionFailure, PredictionResult,
    Target, TimeSeriesSample,
};

use super::feature_builder::{FeatureBuilder, FeatureError};
use super::registry::ModelRegistry;
use super::training;

/// Forecasting errors.
///
/// Per-pair errors in `predict_all` are collected and returned alongside
/// successful results; they never abort the whole batch.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ForecastError {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    /// The feature vector's key set does not match the schema the model was
    /// trained on. Fatal to that prediction; indicates a stale model or a
    /// builder change and must not be coerced.
    #[error("feature schema mismatch for {key}: model expects {expected} features, got {actual}")]
    SchemaMismatch {
        key: ModelKey,
        expected: usize,
        actual: usize,
    },

    /// No trained model exists for the requested (target, horizon) pair.
    /// Partial failure: other pairs are still served.
    #[error("no trained model for {target}@{horizon}")]
    UnsupportedHorizon { target: Target, horizon: Horizon },

    /// Too few labeled rows to attempt a fit. Fatal to that training
    /// invocation; a degenerate model is never produced silently.
    #[error("training set too small: {labeled} labeled rows, minimum {minimum}")]
    EmptyTrainingSet { labeled: usize, minimum: usize },

    #[error("prediction for {key} is not finite")]
    NonFinitePrediction { key: ModelKey },

    #[error("training failed: {0}")]
    Training(String),
}

/// Inference-side orchestration over the feature builder and model registry.
///
/// The registry is injected, never ambient; models resolved for an in-flight
/// call stay valid while a retrain swaps the slot underneath.
#[derive(Debug)]
pub struct ForecastService {
    builder: FeatureBuilder,
    registry: Arc<ModelRegistry>,
}

impl ForecastService {
    pub fn new(settings: ForecastSettings, registry: Arc<ModelRegistry>) -> Self {
        Self {
            builder: FeatureBuilder::new(settings),
            registry,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn builder(&self) -> &FeatureBuilder {
        &self.builder
    }

    /// Produce forecasts for every requested (target, horizon) pair.
    ///
    /// Features are built online from the current snapshot plus whatever
    /// trailing history is available. Pairs without a trained model fail
    /// individually with `UnsupportedHorizon` while the rest of the batch is
    /// still served.
    pub fn predict_all(
        &self,
        trailing_history: &[TimeSeriesSample],
        current: &TimeSeriesSample,
        targets: &[Target],
        horizons: &[Horizon],
    ) -> PredictionBatch {
        let mut batch = PredictionBatch::default();

        for &target in targets {
            let mut result = PredictionResult::new(target);

            for &horizon in horizons {
                match self.predict_one(trailing_history, current, target, horizon) {
                    Ok(value) => {
                        result.horizons.insert(horizon, value);
                    }
                    Err(error) => batch.failures.push(PredictionFailure {
                        target,
                        horizon,
                        error: error.to_string(),
                    }),
                }
            }

            if !result.horizons.is_empty() {
                batch.results.push(result);
            }
        }

        batch
    }

    fn predict_one(
        &self,
        trailing_history: &[TimeSeriesSample],
        current: &TimeSeriesSample,
        target: Target,
        horizon: Horizon,
    ) -> Result<f64, ForecastError> {
        let key = ModelKey::new(target, horizon);
        let model = self
            .registry
            .get(key)
            .ok_or(ForecastError::UnsupportedHorizon { target, horizon })?;

        let features = self
            .builder
            .build_online(trailing_history, current, target, horizon);
        training::predict(&model, &features)
    }

    /// Administrative entry point: train one model and install it.
    ///
    /// The freshly trained model replaces the slot's previous occupant
    /// atomically; the held-out metrics ride along on the returned model.
    pub fn train_and_install(
        &self,
        history: &[TimeSeriesSample],
        target: Target,
        horizon: Horizon,
    ) -> Result<Arc<ForecastModel>, ForecastError> {
        let model = training::train_model(&self.builder, history, target, horizon)?;
        Ok(self.registry.install(model))
    }
}
