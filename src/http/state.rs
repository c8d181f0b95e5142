//! Application state for the HTTP server.

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::services::job_tracker::JobTracker;
use crate::services::{ForecastService, StaffOptimizer, SyntheticGenerator};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Repository instance for history and model storage
    pub repository: Arc<dyn FullRepository>,
    /// Forecast pipeline (feature builder + model registry)
    pub forecast: Arc<ForecastService>,
    /// Staff allocation optimizer with its rules table
    pub optimizer: Arc<StaffOptimizer>,
    /// Synthetic data generator for seeding and demos
    pub generator: Arc<SyntheticGenerator>,
    /// Tracker for background training jobs
    pub job_tracker: JobTracker,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn FullRepository>,
        forecast: Arc<ForecastService>,
        optimizer: Arc<StaffOptimizer>,
    ) -> Self {
        Self {
            repository,
            forecast,
            optimizer,
            generator: Arc::new(SyntheticGenerator::default()),
            job_tracker: JobTracker::new(),
        }
    }
}
