//! Data Transfer Objects for the HTTP API.
//!
//! Domain types that already derive Serialize/Deserialize (samples, rosters,
//! prediction batches, optimization results) cross the wire as-is; this
//! module adds the request/response envelopes around them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use crate::models::{
    Horizon, OptimizationConstraints, OptimizationResult, PredictionBatch, StaffRoster, Target,
    TimeSeriesSample,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Repository connectivity
    pub database: String,
}

/// Current system status: newest sample plus model availability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub latest_sample: Option<TimeSeriesSample>,
    pub history_len: usize,
    pub models_loaded: usize,
    /// (target, horizon) slots without a trained model.
    pub missing_models: Vec<String>,
}

/// Response for the history listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub samples: Vec<TimeSeriesSample>,
    pub total: usize,
}

/// Request body for synthetic history generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateHistoryRequest {
    /// Days of hourly data to generate
    #[serde(default = "default_days")]
    pub days: u32,
    /// RNG seed; fixed default keeps demo data reproducible
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_days() -> u32 {
    7
}

fn default_seed() -> u64 {
    42
}

/// Response for synthetic history generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateHistoryResponse {
    pub appended: usize,
    pub total: usize,
}

/// Request body for resource predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictRequest {
    /// Snapshot to predict from; defaults to the newest stored sample.
    #[serde(default)]
    pub current_state: Option<TimeSeriesSample>,
    /// Requested targets; defaults to all.
    #[serde(default)]
    pub targets: Option<Vec<Target>>,
    /// Requested horizons; defaults to all.
    #[serde(default)]
    pub horizons: Option<Vec<Horizon>>,
}

/// Request body for staff optimization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    pub current_staff: StaffRoster,
    /// Direct demand input; when absent, the 1-hour forecasts are used.
    #[serde(default)]
    pub predicted_demand: Option<BTreeMap<Target, f64>>,
    pub constraints: OptimizationConstraints,
}

/// Response for staff optimization, echoing the demand that was optimized
/// against (relevant when it came from the forecast pipeline).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeResponse {
    #[serde(flatten)]
    pub result: OptimizationResult,
    pub demand_used: BTreeMap<Target, f64>,
}

/// Request body for model training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainRequest {
    /// Targets to train; defaults to all.
    #[serde(default)]
    pub targets: Option<Vec<Target>>,
    /// Horizons to train; defaults to all.
    #[serde(default)]
    pub horizons: Option<Vec<Horizon>>,
    /// Cap on the history length used for training, in hours.
    #[serde(default)]
    pub history_hours: Option<usize>,
}

/// Response for training kickoff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainResponse {
    /// Job ID for tracking the async training run
    pub job_id: String,
    /// Message about the operation
    pub message: String,
}

/// Job status response for async processing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    pub description: String,
    pub status: String,
    pub logs: Vec<crate::services::job_tracker::LogEntry>,
    /// Result if completed
    pub result: Option<serde_json::Value>,
}
