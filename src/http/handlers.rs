//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic.

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    response::sse::{Event, Sse},
    Json,
};
use chrono::{Duration as ChronoDuration, DurationRound, Utc};
use futures::stream::Stream;
use serde::Deserialize;

use super::dto::{
    GenerateHistoryRequest, GenerateHistoryResponse, HealthResponse, HistoryResponse,
    JobStatusResponse, OptimizeRequest, OptimizeResponse, PredictRequest, StatusResponse,
    TrainRequest, TrainResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::db::repository::{HistoryRepository, ModelRepository};
use crate::models::{Horizon, ModelKey, PredictionBatch, Target, TimeSeriesSample};
use crate::services::job_tracker::{JobStatus, LogLevel};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health & Status
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the
/// repository is reachable.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.repository.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

/// GET /v1/status
///
/// Current system status: newest sample and model availability.
pub async fn get_status(State(state): State<AppState>) -> HandlerResult<StatusResponse> {
    let latest_sample = state.repository.latest().await?;
    let history_len = state.repository.fetch_history(usize::MAX).await?.len();

    let registry = state.forecast.registry();
    let missing_models = match registry.validate_complete(ModelKey::grid()) {
        Ok(()) => vec![],
        Err(missing) => missing.iter().map(|key| key.to_string()).collect(),
    };

    Ok(Json(StatusResponse {
        latest_sample,
        history_len,
        models_loaded: registry.len(),
        missing_models,
    }))
}

// =============================================================================
// History
// =============================================================================

/// Query parameters for the history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    100
}

/// GET /v1/history?limit=N
///
/// The most recent samples in ascending timestamp order.
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> HandlerResult<HistoryResponse> {
    let samples = state.repository.fetch_history(query.limit).await?;
    let total = samples.len();
    Ok(Json(HistoryResponse { samples, total }))
}

/// POST /v1/history/synthetic
///
/// Generate and store synthetic hourly history, continuing after the
/// current series end.
pub async fn generate_history(
    State(state): State<AppState>,
    Json(request): Json<GenerateHistoryRequest>,
) -> HandlerResult<GenerateHistoryResponse> {
    if request.days == 0 {
        return Err(AppError::BadRequest("days must be > 0".to_string()));
    }
    let hours = request.days as usize * 24;

    let start = match state.repository.latest().await? {
        Some(last) => last.timestamp + ChronoDuration::hours(1),
        None => (Utc::now() - ChronoDuration::hours(hours as i64))
            .duration_trunc(ChronoDuration::hours(1))
            .map_err(|e| AppError::Internal(e.to_string()))?,
    };

    let samples = state.generator.generate(start, hours, request.seed);
    let appended = state.repository.append_samples(samples).await?;
    let total = state.repository.fetch_history(usize::MAX).await?.len();

    Ok(Json(GenerateHistoryResponse { appended, total }))
}

// =============================================================================
// Forecasting
// =============================================================================

/// POST /v1/predictions
///
/// Forecast the requested targets across the requested horizons. Pairs
/// without a trained model are reported in `failures` while the rest of the
/// batch is served.
pub async fn predict_resources(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> HandlerResult<PredictionBatch> {
    let current = match request.current_state {
        Some(sample) => sample,
        None => state.repository.latest().await?.ok_or_else(|| {
            AppError::BadRequest(
                "no history available; supply current_state or generate data".to_string(),
            )
        })?,
    };

    let trailing = trailing_history(&state, &current).await?;
    let targets = request.targets.unwrap_or_else(|| Target::ALL.to_vec());
    let horizons = request.horizons.unwrap_or_else(|| Horizon::ALL.to_vec());

    let batch = state
        .forecast
        .predict_all(&trailing, &current, &targets, &horizons);
    Ok(Json(batch))
}

/// Trailing history strictly before the snapshot, long enough for the
/// largest lag window.
async fn trailing_history(
    state: &AppState,
    current: &TimeSeriesSample,
) -> Result<Vec<TimeSeriesSample>, AppError> {
    let lookback = state.forecast.builder().settings().max_lookback_hours() as usize + 48;
    let mut history = state.repository.fetch_history(lookback).await?;
    history.retain(|s| s.timestamp < current.timestamp);
    Ok(history)
}

// =============================================================================
// Staffing
// =============================================================================

/// POST /v1/staffing/optimize
///
/// Solve for a cost-minimizing staff allocation. Demand can be supplied
/// directly or filled in from the 1-hour-horizon forecasts.
pub async fn optimize_staff(
    State(state): State<AppState>,
    Json(request): Json<OptimizeRequest>,
) -> HandlerResult<OptimizeResponse> {
    let demand = match request.predicted_demand {
        Some(demand) if !demand.is_empty() => demand,
        _ => forecast_demand(&state).await?,
    };

    let result = state
        .optimizer
        .optimize(&request.current_staff, &demand, &request.constraints);

    Ok(Json(OptimizeResponse {
        result,
        demand_used: demand,
    }))
}

/// Demand for the optimizer from the forecast pipeline's 1-hour output.
async fn forecast_demand(state: &AppState) -> Result<BTreeMap<Target, f64>, AppError> {
    let current = state.repository.latest().await?.ok_or_else(|| {
        AppError::BadRequest(
            "no predicted_demand supplied and no history to forecast from".to_string(),
        )
    })?;
    let trailing = trailing_history(state, &current).await?;

    let batch = state.forecast.predict_all(
        &trailing,
        &current,
        &[Target::Admissions, Target::BedOccupancy],
        &[Horizon::OneHour],
    );

    let mut demand = BTreeMap::new();
    for result in &batch.results {
        if let Some(value) = result.value(Horizon::OneHour) {
            demand.insert(result.target, value);
        }
    }
    if demand.is_empty() {
        return Err(AppError::BadRequest(
            "no predicted_demand supplied and no trained models to forecast demand".to_string(),
        ));
    }
    Ok(demand)
}

// =============================================================================
// Training
// =============================================================================

/// POST /v1/models/train
///
/// Start a background training job over the requested (target, horizon)
/// pairs; defaults to the full grid. Returns 202 with a job id.
pub async fn train_models(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<(axum::http::StatusCode, Json<TrainResponse>), AppError> {
    let targets = request.targets.unwrap_or_else(|| Target::ALL.to_vec());
    let horizons = request.horizons.unwrap_or_else(|| Horizon::ALL.to_vec());
    if targets.is_empty() || horizons.is_empty() {
        return Err(AppError::BadRequest(
            "targets and horizons must be non-empty".to_string(),
        ));
    }

    let pair_count = targets.len() * horizons.len();
    let job_id = state
        .job_tracker
        .create_job(format!("train {pair_count} forecast models"));
    let response_job_id = job_id.clone();

    let task_state = state.clone();
    let history_hours = request.history_hours;
    tokio::spawn(async move {
        run_training_job(task_state, job_id, targets, horizons, history_hours).await;
    });

    Ok((
        axum::http::StatusCode::ACCEPTED,
        Json(TrainResponse {
            job_id: response_job_id.clone(),
            message: format!(
                "Training started. Track progress at /v1/jobs/{response_job_id}/logs"
            ),
        }),
    ))
}

async fn run_training_job(
    state: AppState,
    job_id: String,
    targets: Vec<Target>,
    horizons: Vec<Horizon>,
    history_hours: Option<usize>,
) {
    let tracker = state.job_tracker.clone();
    let limit = history_hours.unwrap_or(usize::MAX);
    let history = match state.repository.fetch_history(limit).await {
        Ok(history) => history,
        Err(e) => {
            tracker.fail_job(&job_id, format!("failed to fetch history: {e}"));
            return;
        }
    };
    tracker.log(
        &job_id,
        LogLevel::Info,
        format!("training on {} samples", history.len()),
    );

    let mut trained = Vec::new();
    let mut failed = Vec::new();
    for &target in &targets {
        for &horizon in &horizons {
            let key = ModelKey::new(target, horizon);
            match state.forecast.train_and_install(&history, target, horizon) {
                Ok(model) => {
                    tracker.log(
                        &job_id,
                        LogLevel::Success,
                        format!(
                            "{key}: mae={:.3} mse={:.3}",
                            model.metrics.mae, model.metrics.mse
                        ),
                    );
                    let saved_id = match state.repository.save_model(&model).await {
                        Ok(id) => Some(id.value().to_string()),
                        Err(e) => {
                            tracker.log(
                                &job_id,
                                LogLevel::Warning,
                                format!("{key}: trained but not persisted: {e}"),
                            );
                            None
                        }
                    };
                    trained.push(serde_json::json!({
                        "model": key.to_string(),
                        "mae": model.metrics.mae,
                        "mse": model.metrics.mse,
                        "model_id": saved_id,
                    }));
                }
                Err(e) => {
                    tracker.log(&job_id, LogLevel::Error, format!("{key}: {e}"));
                    failed.push(key.to_string());
                }
            }
        }
    }

    if trained.is_empty() {
        tracker.fail_job(&job_id, "no model could be trained");
        return;
    }
    tracker.complete_job(
        &job_id,
        Some(serde_json::json!({
            "trained": trained,
            "failed": failed,
        })),
    );
}

// =============================================================================
// Jobs
// =============================================================================

/// GET /v1/jobs/{job_id}
///
/// Get the status of a background job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> HandlerResult<JobStatusResponse> {
    let job = state
        .job_tracker
        .get_job(&job_id)
        .ok_or_else(|| AppError::NotFound(format!("Job {} not found", job_id)))?;

    Ok(Json(JobStatusResponse {
        job_id: job.job_id,
        description: job.description,
        status: format!("{:?}", job.status).to_lowercase(),
        logs: job.logs,
        result: job.result,
    }))
}

/// GET /v1/jobs/{job_id}/logs
///
/// Stream job logs via Server-Sent Events (SSE).
pub async fn stream_job_logs(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    // Verify job exists
    if state.job_tracker.get_job(&job_id).is_none() {
        return Err(AppError::NotFound(format!("Job {} not found", job_id)));
    }

    let tracker = state.job_tracker.clone();
    let stream = async_stream::stream! {
        let mut last_log_count = 0;
        loop {
            let logs = tracker.get_logs(&job_id);
            for log in logs.iter().skip(last_log_count) {
                let event_data = serde_json::to_string(log).unwrap_or_default();
                yield Ok(Event::default().data(event_data));
            }
            last_log_count = logs.len();

            // Close the stream with a final status event once the job settles.
            if let Some(job) = tracker.get_job(&job_id) {
                if job.status != JobStatus::Running {
                    let final_event = serde_json::json!({
                        "status": job.status,
                        "result": job.result,
                    });
                    yield Ok(Event::default()
                        .event("complete")
                        .data(serde_json::to_string(&final_event).unwrap_or_default()));
                    break;
                }
            } else {
                break;
            }

            tokio::time::sleep(Duration::from_millis(500)).await;
        }
    };

    Ok(Sse::new(stream))
}
