//! Public API surface for the forecasting backend.
//!
//! This file consolidates the serializable types callers exchange with the
//! core: samples, forecast vocabulary, prediction results, rosters, and
//! optimization inputs/outputs. All types derive Serialize/Deserialize for
//! JSON serialization.

pub use crate::models::forecast::{
    FeatureVector, ForecastModel, ModelId, ModelMetrics, PredictionBatch, PredictionFailure,
    PredictionResult,
};
pub use crate::models::sample::{Horizon, ModelKey, Target, TimeSeriesSample, UnknownNameError};
pub use crate::models::staffing::{
    HeadcountBounds, OptimizationConstraints, OptimizationResult, Shift, SolverStatus,
    StaffCategory, StaffRoster,
};
