//! In-memory repository backend.
//!
//! Keeps the historical series sorted by timestamp with duplicate
//! timestamps rejected, and stores serialized models keyed by their
//! content checksum. Suitable for tests, local development, and
//! single-process deployments; no data survives a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::db::checksum::calculate_checksum;
use crate::db::repository::{
    HistoryRepository, ModelRepository, RepositoryError, RepositoryResult,
};
use crate::models::{ForecastModel, ModelId, TimeSeriesSample};

#[derive(Debug, Default)]
pub struct LocalRepository {
    history: RwLock<Vec<TimeSeriesSample>>,
    models: RwLock<BTreeMap<ModelId, String>>,
}

impl LocalRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a repository pre-populated with a history, for tests and
    /// bootstrap seeding.
    pub fn with_history(samples: Vec<TimeSeriesSample>) -> RepositoryResult<Self> {
        let repo = Self::new();
        {
            let mut history = repo.history.write();
            *history = samples;
            history.sort_by_key(|s| s.timestamp);
            let before = history.len();
            history.dedup_by_key(|s| s.timestamp);
            if history.len() != before {
                return Err(RepositoryError::Validation(
                    "duplicate timestamps in seeded history".to_string(),
                ));
            }
        }
        Ok(repo)
    }
}

#[async_trait]
impl HistoryRepository for LocalRepository {
    async fn fetch_history(&self, limit: usize) -> RepositoryResult<Vec<TimeSeriesSample>> {
        let history = self.history.read();
        let start = history.len().saturating_sub(limit);
        Ok(history[start..].to_vec())
    }

    async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<TimeSeriesSample>> {
        let history = self.history.read();
        Ok(history
            .iter()
            .filter(|s| s.timestamp >= start && s.timestamp < end)
            .cloned()
            .collect())
    }

    async fn latest(&self) -> RepositoryResult<Option<TimeSeriesSample>> {
        Ok(self.history.read().last().cloned())
    }

    async fn append_samples(&self, samples: Vec<TimeSeriesSample>) -> RepositoryResult<usize> {
        let mut history = self.history.write();
        let mut appended = 0;
        for sample in samples {
            match history.last() {
                Some(last) if sample.timestamp <= last.timestamp => {
                    return Err(RepositoryError::Validation(format!(
                        "sample at {} is not after the series end {}",
                        sample.timestamp, last.timestamp
                    )));
                }
                _ => {
                    history.push(sample);
                    appended += 1;
                }
            }
        }
        Ok(appended)
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl ModelRepository for LocalRepository {
    async fn save_model(&self, model: &ForecastModel) -> RepositoryResult<ModelId> {
        let payload = serde_json::to_string(model)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
        let id = ModelId::new(calculate_checksum(&payload));
        self.models.write().insert(id.clone(), payload);
        Ok(id)
    }

    async fn load_model(&self, id: &ModelId) -> RepositoryResult<ForecastModel> {
        let models = self.models.read();
        let payload = models.get(id).ok_or_else(|| RepositoryError::NotFound {
            entity: "model",
            id: id.value().to_string(),
        })?;
        serde_json::from_str(payload).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn list_models(&self) -> RepositoryResult<Vec<ModelId>> {
        Ok(self.models.read().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Horizon, ModelKey, ModelMetrics, Target};
    use chrono::{Duration, TimeZone};

    fn sample_at(hours: i64) -> TimeSeriesSample {
        TimeSeriesSample {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                + Duration::hours(hours),
            admissions: 6.0,
            discharges: 5.0,
            bed_occupancy: 150.0,
            oxygen_level: 1500.0,
            occupancy_rate: 60.0,
        }
    }

    fn model() -> ForecastModel {
        ForecastModel {
            key: ModelKey::new(Target::Admissions, Horizon::OneHour),
            feature_names: vec!["lag_1h".to_string()],
            means: vec![0.0],
            stds: vec![1.0],
            weights: vec![0.9],
            intercept: 2.0,
            metrics: ModelMetrics { mae: 1.0, mse: 2.0 },
            training_rows: 120,
            trained_at: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_history_fetch_is_ordered_and_limited() {
        let repo =
            LocalRepository::with_history((0..10).map(sample_at).collect()).unwrap();

        let recent = repo.fetch_history(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert!(recent.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(recent[2].timestamp, sample_at(9).timestamp);
    }

    #[tokio::test]
    async fn test_append_rejects_out_of_order_samples() {
        let repo = LocalRepository::with_history(vec![sample_at(0), sample_at(1)]).unwrap();

        let err = repo.append_samples(vec![sample_at(1)]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));

        let appended = repo.append_samples(vec![sample_at(2)]).await.unwrap();
        assert_eq!(appended, 1);
        assert_eq!(repo.latest().await.unwrap().unwrap().timestamp, sample_at(2).timestamp);
    }

    #[tokio::test]
    async fn test_fetch_range_is_half_open() {
        let repo = LocalRepository::with_history((0..24).map(sample_at).collect()).unwrap();
        let start = sample_at(6).timestamp;
        let end = sample_at(12).timestamp;

        let range = repo.fetch_range(start, end).await.unwrap();
        assert_eq!(range.len(), 6);
        assert_eq!(range[0].timestamp, start);
    }

    #[tokio::test]
    async fn test_model_save_load_round_trip() {
        let repo = LocalRepository::new();
        let original = model();

        let id = repo.save_model(&original).await.unwrap();
        assert_eq!(id.value().len(), 64);

        let loaded = repo.load_model(&id).await.unwrap();
        assert_eq!(loaded.key, original.key);
        assert_eq!(loaded.weights, original.weights);

        // Content addressing: saving the identical model yields the same id.
        let again = repo.save_model(&original).await.unwrap();
        assert_eq!(again, id);
        assert_eq!(repo.list_models().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_unknown_model_is_not_found() {
        let repo = LocalRepository::new();
        let err = repo
            .load_model(&ModelId::new("missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_seed_timestamps_rejected() {
        let err = LocalRepository::with_history(vec![sample_at(0), sample_at(0)]).unwrap_err();
        assert!(matches!(err, RepositoryError::Validation(_)));
    }
}
