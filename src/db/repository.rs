//! Repository traits and error types for the storage layer.
//!
//! The core consumes two storage interfaces: an ordered-by-timestamp read of
//! the historical series, and opaque persistence for trained models. Both
//! are trait objects so backends can be swapped without touching the
//! forecasting or optimization code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{ForecastModel, ModelId, TimeSeriesSample};

/// Result type for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Error type for repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {entity} '{id}'")]
    NotFound { entity: &'static str, id: String },

    /// Data failed validation before or after a storage operation.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Ordered read/write access to the historical time series.
///
/// The forecasting core only reads; writes exist for the data-source
/// collaborators (synthetic generation, ingestion).
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// The most recent `limit` samples in ascending timestamp order.
    async fn fetch_history(&self, limit: usize) -> RepositoryResult<Vec<TimeSeriesSample>>;

    /// Samples with `start <= timestamp < end`, ascending.
    async fn fetch_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> RepositoryResult<Vec<TimeSeriesSample>>;

    /// The newest sample, if any.
    async fn latest(&self) -> RepositoryResult<Option<TimeSeriesSample>>;

    /// Append samples, keeping the series ordered and duplicate-free.
    async fn append_samples(&self, samples: Vec<TimeSeriesSample>) -> RepositoryResult<usize>;

    /// Whether the backend is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}

/// Opaque persistence for trained forecast models.
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Persist a model, returning its content-addressed identifier.
    async fn save_model(&self, model: &ForecastModel) -> RepositoryResult<ModelId>;

    /// Load a previously saved model.
    async fn load_model(&self, id: &ModelId) -> RepositoryResult<ForecastModel>;

    /// Identifiers of all persisted models.
    async fn list_models(&self) -> RepositoryResult<Vec<ModelId>>;
}

/// Combined repository surface the application wires together.
pub trait FullRepository: HistoryRepository + ModelRepository {}

impl<T: HistoryRepository + ModelRepository> FullRepository for T {}
