//! Training and single-model inference for the forecast model set.
//!
//! Each (target, horizon) pair gets its own independently trained ridge
//! regressor; there is no shared state or joint loss across models.
//! Correlations between targets are captured only through shared input
//! features.

use chrono::{Duration, Utc};
use ndarray::{Array1, Array2};

use super::feature_builder::FeatureBuilder;
use super::forecast::ForecastError;
use crate::algorithms::regression;
use crate::models::{
    FeatureVector, ForecastModel, Horizon, ModelKey, ModelMetrics, Target, TimeSeriesSample,
};

/// Train a model for one (target, horizon) pair from raw history.
///
/// Labeled rows pair strict features at time T with the target's actual
/// value at T + horizon; rows are split chronologically so no future sample
/// leaks into the training prefix. Held-out MAE/MSE are diagnostic: training
/// succeeds regardless of the error level, but the numbers are surfaced for
/// observability.
pub fn train_model(
    builder: &FeatureBuilder,
    history: &[TimeSeriesSample],
    target: Target,
    horizon: Horizon,
) -> Result<ForecastModel, ForecastError> {
    let key = ModelKey::new(target, horizon);
    let labeled = build_labeled_rows(builder, history, target, horizon);

    let minimum = builder.settings().min_training_rows;
    if labeled.len() < minimum {
        return Err(ForecastError::EmptyTrainingSet {
            labeled: labeled.len(),
            minimum,
        });
    }

    let schema = builder.schema();
    let n_train = ((labeled.len() as f64) * builder.settings().train_fraction).floor() as usize;
    let n_train = n_train.clamp(1, labeled.len() - 1);
    let (train_rows, test_rows) = labeled.split_at(n_train);

    let x_train = to_matrix(train_rows, &schema, key)?;
    let y_train: Array1<f64> = train_rows.iter().map(|(_, label)| *label).collect();

    let standardization = regression::column_standardization(&x_train.view());
    let x_std = regression::standardize(&x_train.view(), &standardization);
    let fit = regression::fit_ridge(
        &x_std.view(),
        &y_train.view(),
        builder.settings().ridge_lambda,
    );

    // Held-out evaluation on the chronological suffix.
    let x_test = to_matrix(test_rows, &schema, key)?;
    let x_test_std = regression::standardize(&x_test.view(), &standardization);
    let predicted: Vec<f64> = x_test_std
        .rows()
        .into_iter()
        .map(|row| {
            let row: Vec<f64> = row.iter().copied().collect();
            regression::predict_row(&fit.weights, fit.intercept, &row).max(0.0)
        })
        .collect();
    let actual: Vec<f64> = test_rows.iter().map(|(_, label)| *label).collect();

    let metrics = ModelMetrics {
        mae: regression::mean_absolute_error(&actual, &predicted),
        mse: regression::mean_squared_error(&actual, &predicted),
    };
    log::info!(
        "trained {key}: rows={} held_out={} mae={:.3} mse={:.3}",
        train_rows.len(),
        test_rows.len(),
        metrics.mae,
        metrics.mse,
    );

    Ok(ForecastModel {
        key,
        feature_names: schema,
        means: standardization.means,
        stds: standardization.stds,
        weights: fit.weights,
        intercept: fit.intercept,
        metrics,
        training_rows: train_rows.len(),
        trained_at: Utc::now(),
    })
}

/// Predict one value from a trained model.
///
/// Fails with a schema mismatch when the vector's key set differs from the
/// schema the model was trained on; drift indicates a stale model or a
/// builder change and is never silently coerced.
pub fn predict(model: &ForecastModel, features: &FeatureVector) -> Result<f64, ForecastError> {
    let ordered = features
        .to_ordered(&model.feature_names)
        .ok_or_else(|| ForecastError::SchemaMismatch {
            key: model.key,
            expected: model.feature_names.len(),
            actual: features.len(),
        })?;

    let standardized: Vec<f64> = ordered
        .iter()
        .zip(model.means.iter().zip(&model.stds))
        .map(|(value, (mean, std))| (value - mean) / std)
        .collect();

    let value =
        regression::predict_row(&model.weights, model.intercept, &standardized).max(0.0);
    if !value.is_finite() {
        return Err(ForecastError::NonFinitePrediction { key: model.key });
    }
    Ok(value)
}

/// Assemble (features, label) rows in chronological order.
///
/// A row exists for reference time T only when the strict lookback fits the
/// available history and a sample exists exactly at T + horizon.
fn build_labeled_rows(
    builder: &FeatureBuilder,
    history: &[TimeSeriesSample],
    target: Target,
    horizon: Horizon,
) -> Vec<(FeatureVector, f64)> {
    let lead = Duration::hours(horizon.hours());
    let mut rows = Vec::new();

    for (i, sample) in history.iter().enumerate() {
        let label_time = sample.timestamp + lead;
        let label = history[i..]
            .iter()
            .take_while(|s| s.timestamp <= label_time)
            .find(|s| s.timestamp == label_time)
            .map(|s| s.value(target));
        let Some(label) = label else { continue };

        match builder.build(history, sample.timestamp, target, horizon) {
            Ok(features) => rows.push((features, label)),
            // Early reference times legitimately lack lookback; skip them.
            Err(super::feature_builder::FeatureError::InsufficientHistory { .. }) => continue,
        }
    }

    rows
}

fn to_matrix(
    rows: &[(FeatureVector, f64)],
    schema: &[String],
    key: ModelKey,
) -> Result<Array2<f64>, ForecastError> {
    let mut data = Vec::with_capacity(rows.len() * schema.len());
    for (features, _) in rows {
        let ordered = features
            .to_ordered(schema)
            .ok_or(ForecastError::SchemaMismatch {
                key,
                expected: schema.len(),
                actual: features.len(),
            })?;
        data.extend(ordered);
    }
    Array2::from_shape_vec((rows.len(), schema.len()), data)
        .map_err(|e| ForecastError::Training(e.to_string()))
}
