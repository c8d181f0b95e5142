//! Supervised-learning feature construction over the historical series.
//!
//! One `FeatureVector` is produced per (target, horizon, reference-time)
//! triple: calendar features at the forecasted instant, lag and rolling
//! statistics looking strictly backwards from the reference time, the
//! current base values, and a small fixed set of interaction terms. The
//! schema is fixed per target so a model trained on one window applies to
//! every other window.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::config::ForecastSettings;
use crate::models::{FeatureVector, Horizon, Target, TimeSeriesSample};

/// Feature-construction failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FeatureError {
    /// The lag/rolling lookback extends before the start of available
    /// history. Recoverable by supplying more history; never zero-filled in
    /// the strict path to avoid biasing early predictions.
    #[error(
        "insufficient history: features need {required_hours}h before the reference time, \
         only {available_hours}h available"
    )]
    InsufficientHistory {
        required_hours: i64,
        available_hours: i64,
    },
}

/// Builds feature vectors from an ordered history of samples.
#[derive(Debug, Clone)]
pub struct FeatureBuilder {
    settings: ForecastSettings,
}

impl FeatureBuilder {
    pub fn new(settings: ForecastSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// The fixed feature schema, in deterministic order.
    pub fn schema(&self) -> Vec<String> {
        // Built by constructing a vector from a placeholder sample; keeps the
        // schema definition in one place (the feature assembly itself).
        let sample = TimeSeriesSample {
            timestamp: DateTime::<Utc>::MIN_UTC,
            admissions: 0.0,
            discharges: 0.0,
            bed_occupancy: 0.0,
            oxygen_level: 0.0,
            occupancy_rate: 0.0,
        };
        self.assemble(&sample, sample.timestamp, Horizon::OneHour, &LookbackValues::degraded(&sample, Target::Admissions, &self.settings))
            .names()
    }

    /// Strict feature construction for training.
    ///
    /// Uses only samples at or before `reference_time`; fails with
    /// [`FeatureError::InsufficientHistory`] when any lag or rolling window
    /// would reach before the first available sample.
    pub fn build(
        &self,
        history: &[TimeSeriesSample],
        reference_time: DateTime<Utc>,
        target: Target,
        horizon: Horizon,
    ) -> Result<FeatureVector, FeatureError> {
        let past = past_slice(history, reference_time);
        let reference = past.last().ok_or(FeatureError::InsufficientHistory {
            required_hours: self.settings.max_lookback_hours(),
            available_hours: 0,
        })?;

        let history_start = past[0].timestamp;
        let available_hours = (reference_time - history_start).num_hours();
        let required_hours = self.settings.max_lookback_hours();
        if available_hours < required_hours {
            return Err(FeatureError::InsufficientHistory {
                required_hours,
                available_hours,
            });
        }

        let lookback = LookbackValues::strict(past, reference_time, target, &self.settings);
        Ok(self.assemble(reference, reference_time, horizon, &lookback))
    }

    /// Online feature construction for serving.
    ///
    /// Uses whatever trailing history is available; lag and rolling inputs
    /// that would reach before the first sample degrade to the current
    /// sample's value. This is a documented approximation for cold starts,
    /// not an error.
    pub fn build_online(
        &self,
        trailing_history: &[TimeSeriesSample],
        current: &TimeSeriesSample,
        target: Target,
        horizon: Horizon,
    ) -> FeatureVector {
        let reference_time = current.timestamp;
        let past = past_slice(trailing_history, reference_time);

        let mut window: Vec<&TimeSeriesSample> = past.iter().collect();
        window.push(current);

        let lookback =
            LookbackValues::online(&window, current, reference_time, target, &self.settings);
        self.assemble(current, reference_time, horizon, &lookback)
    }

    fn assemble(
        &self,
        reference: &TimeSeriesSample,
        reference_time: DateTime<Utc>,
        horizon: Horizon,
        lookback: &LookbackValues,
    ) -> FeatureVector {
        let forecast_time = reference_time + Duration::hours(horizon.hours());
        let hour = forecast_time.hour() as f64;
        let day_of_week = forecast_time.weekday().num_days_from_monday() as f64;
        let is_weekend = if day_of_week >= 5.0 { 1.0 } else { 0.0 };

        let mut features = FeatureVector::new();
        features.insert("hour_of_day", hour);
        features.insert("day_of_week", day_of_week);
        features.insert("is_weekend", is_weekend);

        for (lag, value) in self.settings.lag_hours.iter().zip(&lookback.lags) {
            features.insert(format!("lag_{lag}h"), *value);
        }
        for (window, stats) in self
            .settings
            .rolling_window_hours
            .iter()
            .zip(&lookback.rolling)
        {
            features.insert(format!("roll_mean_{window}h"), stats.0);
            features.insert(format!("roll_std_{window}h"), stats.1);
        }

        features.insert("base_admissions", reference.admissions);
        features.insert("base_discharges", reference.discharges);
        features.insert("base_bed_occupancy", reference.bed_occupancy);
        features.insert("base_oxygen_level", reference.oxygen_level);
        features.insert("base_occupancy_rate", reference.occupancy_rate);

        // Fixed interaction terms between base features.
        features.insert("occupancy_rate_x_hour", reference.occupancy_rate * hour);
        features.insert(
            "occupancy_per_oxygen",
            reference.bed_occupancy / (reference.oxygen_level + 1.0),
        );

        features
    }
}

/// Lag values and rolling (mean, std) pairs, one per configured offset.
struct LookbackValues {
    lags: Vec<f64>,
    rolling: Vec<(f64, f64)>,
}

impl LookbackValues {
    fn strict(
        past: &[TimeSeriesSample],
        reference_time: DateTime<Utc>,
        target: Target,
        settings: &ForecastSettings,
    ) -> Self {
        let lags = settings
            .lag_hours
            .iter()
            .map(|&lag| {
                let lag_time = reference_time - Duration::hours(lag);
                // The caller verified the lookback fits, so a sample at or
                // before lag_time always exists.
                let idx = index_at_or_before(past, lag_time).unwrap_or(0);
                past[idx].value(target)
            })
            .collect();

        let rolling = settings
            .rolling_window_hours
            .iter()
            .map(|&window| {
                let window_start = reference_time - Duration::hours(window);
                let values: Vec<f64> = past
                    .iter()
                    .filter(|s| s.timestamp > window_start)
                    .map(|s| s.value(target))
                    .collect();
                window_stats(&values)
            })
            .collect();

        Self { lags, rolling }
    }

    fn online(
        window: &[&TimeSeriesSample],
        current: &TimeSeriesSample,
        reference_time: DateTime<Utc>,
        target: Target,
        settings: &ForecastSettings,
    ) -> Self {
        let fallback = current.value(target);
        let lags = settings
            .lag_hours
            .iter()
            .map(|&lag| {
                let lag_time = reference_time - Duration::hours(lag);
                window
                    .iter()
                    .rev()
                    .find(|s| s.timestamp <= lag_time)
                    .map(|s| s.value(target))
                    .unwrap_or(fallback)
            })
            .collect();

        let rolling = settings
            .rolling_window_hours
            .iter()
            .map(|&window_hours| {
                let window_start = reference_time - Duration::hours(window_hours);
                let values: Vec<f64> = window
                    .iter()
                    .filter(|s| s.timestamp > window_start)
                    .map(|s| s.value(target))
                    .collect();
                if values.is_empty() {
                    (fallback, 0.0)
                } else {
                    window_stats(&values)
                }
            })
            .collect();

        Self { lags, rolling }
    }

    /// All lookback inputs collapsed to the current value; used only to
    /// enumerate the schema.
    fn degraded(sample: &TimeSeriesSample, target: Target, settings: &ForecastSettings) -> Self {
        let value = sample.value(target);
        Self {
            lags: vec![value; settings.lag_hours.len()],
            rolling: vec![(value, 0.0); settings.rolling_window_hours.len()],
        }
    }
}

fn window_stats(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    (mean, var.sqrt())
}

/// The prefix of `history` with timestamps at or before `reference_time`.
fn past_slice(history: &[TimeSeriesSample], reference_time: DateTime<Utc>) -> &[TimeSeriesSample] {
    let end = history.partition_point(|s| s.timestamp <= reference_time);
    &history[..end]
}

/// Index of the latest sample at or before `t`, if any.
fn index_at_or_before(samples: &[TimeSeriesSample], t: DateTime<Utc>) -> Option<usize> {
    let end = samples.partition_point(|s| s.timestamp <= t);
    end.checked_sub(1)
}
