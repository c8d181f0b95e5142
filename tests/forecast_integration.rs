//! End-to-end forecasting pipeline tests over synthetic history.

use std::sync::Arc;

use chrono::{TimeZone, Utc};

use wardcast::algorithms::regression::{mean_absolute_error, std_dev};
use wardcast::config::ForecastSettings;
use wardcast::db::repository::HistoryRepository;
use wardcast::db::LocalRepository;
use wardcast::models::{Horizon, ModelKey, Target, TimeSeriesSample};
use wardcast::services::{predict, train_model, FeatureBuilder, ForecastService, ModelRegistry, SyntheticGenerator};

fn synthetic_history(hours: usize) -> Vec<TimeSeriesSample> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    SyntheticGenerator::default().generate(start, hours, 42)
}

/// Regression guard for the whole pipeline: with 2000 hours of seasonal
/// history, a bed-occupancy model trained on the first 1800 hours must track
/// the remaining 200 hours to well under the series' own variability.
#[test]
fn test_occupancy_model_beats_sanity_threshold() {
    let history = synthetic_history(2000);
    let builder = FeatureBuilder::new(ForecastSettings::default());

    let model = train_model(
        &builder,
        &history[..1800],
        Target::BedOccupancy,
        Horizon::OneHour,
    )
    .expect("training on 1800 hours succeeds");

    let mut actual = Vec::new();
    let mut predicted = Vec::new();
    for t in 1800..1999 {
        let features = builder
            .build(
                &history,
                history[t].timestamp,
                Target::BedOccupancy,
                Horizon::OneHour,
            )
            .expect("lookback fits");
        predicted.push(predict(&model, &features).expect("prediction succeeds"));
        actual.push(history[t + 1].bed_occupancy);
    }

    let occupancy: Vec<f64> = history.iter().map(|s| s.bed_occupancy).collect();
    let threshold = 0.2 * std_dev(&occupancy);
    let mae = mean_absolute_error(&actual, &predicted);
    assert!(
        mae < threshold,
        "held-out mae {mae:.2} exceeds sanity threshold {threshold:.2}"
    );
}

/// Every (target, horizon) pair with a trained model yields a finite,
/// non-negative forecast.
#[tokio::test]
async fn test_full_grid_serves_finite_predictions() {
    let history = synthetic_history(2000);
    let repository = LocalRepository::with_history(history).unwrap();

    let service = ForecastService::new(
        ForecastSettings::default(),
        Arc::new(ModelRegistry::new()),
    );
    let training_history = repository.fetch_history(usize::MAX).await.unwrap();
    for key in ModelKey::grid() {
        service
            .train_and_install(&training_history, key.target, key.horizon)
            .unwrap();
    }
    service
        .registry()
        .validate_complete(ModelKey::grid())
        .expect("all nine slots filled");

    let current = repository.latest().await.unwrap().unwrap();
    let trailing = repository.fetch_history(216).await.unwrap();
    let trailing: Vec<TimeSeriesSample> = trailing
        .into_iter()
        .filter(|s| s.timestamp < current.timestamp)
        .collect();

    let batch = service.predict_all(&trailing, &current, &Target::ALL, &Horizon::ALL);

    assert!(batch.failures.is_empty());
    assert_eq!(batch.results.len(), 3);
    for result in &batch.results {
        for (&horizon, &value) in &result.horizons {
            assert!(
                value.is_finite() && value >= 0.0,
                "{}@{horizon} produced {value}",
                result.target
            );
        }
    }
}

/// A cold-start snapshot with no trailing history is served through the
/// documented degradation instead of failing.
#[test]
fn test_cold_start_snapshot_is_served() {
    let history = synthetic_history(2000);
    let service = ForecastService::new(
        ForecastSettings::default(),
        Arc::new(ModelRegistry::new()),
    );
    for key in ModelKey::grid() {
        service
            .train_and_install(&history, key.target, key.horizon)
            .unwrap();
    }

    let snapshot = TimeSeriesSample {
        timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        admissions: 8.0,
        discharges: 6.0,
        bed_occupancy: 180.0,
        oxygen_level: 1200.0,
        occupancy_rate: 72.0,
    };
    let batch = service.predict_all(&[], &snapshot, &Target::ALL, &Horizon::ALL);

    assert!(batch.failures.is_empty());
    for result in &batch.results {
        assert_eq!(result.horizons.len(), 3);
        assert!(result.horizons.values().all(|v| v.is_finite()));
    }
}

/// Requests mixing served and unserved pairs succeed partially.
#[test]
fn test_partial_grid_reports_failures_without_aborting() {
    let history = synthetic_history(1000);
    let service = ForecastService::new(
        ForecastSettings::default(),
        Arc::new(ModelRegistry::new()),
    );
    // Train only the 1h horizon.
    for target in Target::ALL {
        service
            .train_and_install(&history, target, Horizon::OneHour)
            .unwrap();
    }

    let current = history.last().unwrap().clone();
    let batch = service.predict_all(
        &history[..history.len() - 1],
        &current,
        &Target::ALL,
        &Horizon::ALL,
    );

    assert_eq!(batch.results.len(), 3);
    for result in &batch.results {
        assert_eq!(result.horizons.len(), 1);
        assert!(result.value(Horizon::OneHour).is_some());
    }
    // 3 targets × 2 missing horizons.
    assert_eq!(batch.failures.len(), 6);
}
