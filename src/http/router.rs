//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // System status
        .route("/status", get(handlers::get_status))
        // Historical series
        .route("/history", get(handlers::get_history))
        .route("/history/synthetic", post(handlers::generate_history))
        // Forecasting
        .route("/predictions", post(handlers::predict_resources))
        // Staff optimization
        .route("/staffing/optimize", post(handlers::optimize_staff))
        // Model training (background job)
        .route("/models/train", post(handlers::train_models))
        .route("/jobs/{job_id}", get(handlers::get_job_status))
        .route("/jobs/{job_id}/logs", get(handlers::stream_job_logs));

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::{ForecastSettings, StaffingRules};
    use crate::db::repositories::LocalRepository;
    use crate::services::{ForecastService, ModelRegistry, StaffOptimizer};

    #[test]
    fn test_router_creation() {
        let repo = Arc::new(LocalRepository::new()) as Arc<dyn crate::db::repository::FullRepository>;
        let forecast = Arc::new(ForecastService::new(
            ForecastSettings::default(),
            Arc::new(ModelRegistry::new()),
        ));
        let optimizer = Arc::new(StaffOptimizer::new(StaffingRules::default()));
        let state = AppState::new(repo, forecast, optimizer);
        let _router = create_router(state);
        // If we got here, router was created successfully
    }
}
