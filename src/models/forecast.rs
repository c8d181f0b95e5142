//! Forecasting data model: feature vectors, trained models, prediction results.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::sample::{Horizon, ModelKey, Target};

/// A fixed-schema mapping from feature name to numeric value.
///
/// Built deterministically from a history window ending at a reference
/// timestamp; immutable once built. All vectors produced for the same target
/// share one key set, so a model trained on any of them applies to all.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<String, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature names in deterministic (sorted) order.
    pub fn names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    /// Project the vector onto an explicit schema ordering.
    ///
    /// Returns `None` when the key sets differ, which callers surface as a
    /// schema mismatch rather than coercing.
    pub fn to_ordered(&self, schema: &[String]) -> Option<Vec<f64>> {
        if schema.len() != self.values.len() {
            return None;
        }
        schema
            .iter()
            .map(|name| self.values.get(name).copied())
            .collect()
    }
}

/// Held-out evaluation metrics for a trained model. Diagnostic only; training
/// succeeds regardless of the error level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub mae: f64,
    pub mse: f64,
}

/// A trained ridge-regression forecaster bound to exactly one (target,
/// horizon) pair.
///
/// Created by the training phase and never mutated afterwards; a retrain
/// produces a replacement that the registry swaps in atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastModel {
    pub key: ModelKey,
    /// Feature schema the model was fitted on, in column order.
    pub feature_names: Vec<String>,
    /// Per-column standardization offsets.
    pub means: Vec<f64>,
    /// Per-column standardization scales.
    pub stds: Vec<f64>,
    /// Regression weights, one per standardized column.
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub metrics: ModelMetrics,
    /// Number of labeled rows the fit saw.
    pub training_rows: usize,
    pub trained_at: DateTime<Utc>,
}

/// Content-addressed identifier of a persisted model (hex SHA-256 of the
/// serialized payload).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelId(pub String);

impl ModelId {
    pub fn new(value: impl Into<String>) -> Self {
        ModelId(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

/// Forecast values for one target, keyed by horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub target: Target,
    pub horizons: BTreeMap<Horizon, f64>,
}

impl PredictionResult {
    pub fn new(target: Target) -> Self {
        Self {
            target,
            horizons: BTreeMap::new(),
        }
    }

    pub fn value(&self, horizon: Horizon) -> Option<f64> {
        self.horizons.get(&horizon).copied()
    }
}

/// A (target, horizon) pair that could not be served, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionFailure {
    pub target: Target,
    pub horizon: Horizon,
    pub error: String,
}

/// Outcome of a `predict_all` call: per-pair failures are collected alongside
/// the successes and never abort the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionBatch {
    pub results: Vec<PredictionResult>,
    pub failures: Vec<PredictionFailure>,
}

impl PredictionBatch {
    /// Look up a successful forecast by pair.
    pub fn value(&self, target: Target, horizon: Horizon) -> Option<f64> {
        self.results
            .iter()
            .find(|r| r.target == target)
            .and_then(|r| r.value(horizon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_vector_ordering_is_deterministic() {
        let mut a = FeatureVector::new();
        a.insert("zeta", 1.0);
        a.insert("alpha", 2.0);
        let mut b = FeatureVector::new();
        b.insert("alpha", 5.0);
        b.insert("zeta", 6.0);
        assert_eq!(a.names(), b.names());
    }

    #[test]
    fn test_to_ordered_rejects_schema_drift() {
        let mut v = FeatureVector::new();
        v.insert("lag_1h", 3.0);
        v.insert("hour_of_day", 14.0);

        let schema = vec!["hour_of_day".to_string(), "lag_1h".to_string()];
        assert_eq!(v.to_ordered(&schema), Some(vec![14.0, 3.0]));

        let wrong = vec!["hour_of_day".to_string(), "lag_2h".to_string()];
        assert_eq!(v.to_ordered(&wrong), None);

        let short = vec!["hour_of_day".to_string()];
        assert_eq!(v.to_ordered(&short), None);
    }

    #[test]
    fn test_prediction_batch_lookup() {
        let mut result = PredictionResult::new(Target::Admissions);
        result.horizons.insert(Horizon::OneHour, 12.5);
        let batch = PredictionBatch {
            results: vec![result],
            failures: vec![],
        };
        assert_eq!(batch.value(Target::Admissions, Horizon::OneHour), Some(12.5));
        assert_eq!(batch.value(Target::Admissions, Horizon::SixHours), None);
        assert_eq!(batch.value(Target::OxygenLevel, Horizon::OneHour), None);
    }
}
