//! HTTP Server Binary
//!
//! This is the main entry point for the forecasting REST API server.
//! It seeds the repository, trains the forecast models, sets up the HTTP
//! router, and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin wardcast-server --features "local-repo,http-server"
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `SEED_DAYS`: Days of synthetic history to seed at startup (default: 90, 0 disables)
//! - `SEED`: RNG seed for the synthetic history (default: 42)
//! - `STAFFING_RULES`: Path to a TOML staffing-rules file (default: compiled-in rules)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{Duration, DurationRound, Utc};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use wardcast::config::{ForecastSettings, StaffingRules};
use wardcast::db::repository::HistoryRepository;
use wardcast::db::LocalRepository;
use wardcast::http::{create_router, AppState};
use wardcast::models::ModelKey;
use wardcast::services::{ForecastService, ModelRegistry, StaffOptimizer, SyntheticGenerator};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .init();

    info!("Starting forecasting HTTP server");

    // Staffing rules: from file when configured, compiled-in defaults otherwise.
    let rules = match env::var("STAFFING_RULES") {
        Ok(path) => {
            let rules = StaffingRules::from_toml_file(&path)?;
            info!("Loaded staffing rules v{} from {}", rules.version, path);
            rules
        }
        Err(_) => StaffingRules::default(),
    };

    let repository = Arc::new(LocalRepository::new());
    let registry = Arc::new(ModelRegistry::new());
    let forecast = Arc::new(ForecastService::new(ForecastSettings::default(), registry));
    let optimizer = Arc::new(StaffOptimizer::new(rules));

    seed_and_train(&repository, &forecast).await?;

    let state = AppState::new(repository, forecast, optimizer);
    let app = create_router(state);

    // Determine bind address
    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Seed synthetic history and train the full model grid so the server is
/// immediately useful. Training failures are logged, not fatal: the API
/// reports missing models and training can be retried via /v1/models/train.
async fn seed_and_train(
    repository: &Arc<LocalRepository>,
    forecast: &Arc<ForecastService>,
) -> anyhow::Result<()> {
    let seed_days: i64 = env::var("SEED_DAYS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(90);
    if seed_days == 0 {
        info!("SEED_DAYS=0; starting with an empty repository");
        return Ok(());
    }
    let seed: u64 = env::var("SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let hours = (seed_days * 24) as usize;
    let start = (Utc::now() - Duration::hours(hours as i64))
        .duration_trunc(Duration::hours(1))?;
    let samples = SyntheticGenerator::default().generate(start, hours, seed);
    let appended = repository.append_samples(samples).await.map_err(|e| anyhow::anyhow!(e.to_string()))?;
    info!("Seeded {appended} hours of synthetic history");

    let history = repository
        .fetch_history(usize::MAX)
        .await
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    for key in ModelKey::grid() {
        match forecast.train_and_install(&history, key.target, key.horizon) {
            Ok(model) => info!(
                "{key}: trained (mae={:.3}, mse={:.3})",
                model.metrics.mae, model.metrics.mse
            ),
            Err(e) => warn!("{key}: training failed: {e}"),
        }
    }

    match forecast.registry().validate_complete(ModelKey::grid()) {
        Ok(()) => info!("All model slots trained and installed"),
        Err(missing) => warn!("{} model slots missing after startup training", missing.len()),
    }

    Ok(())
}
