//! Configuration structs for staffing rules and forecast settings.
//!
//! The optimizer's business rules (cost tables, coverage ratios, bounds) and
//! the feature/training knobs live here as explicit, versioned configuration
//! rather than inline constants, loadable from TOML files with compiled-in
//! defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::{HeadcountBounds, Shift, StaffCategory};

/// Versioned staffing business rules consumed by the optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffingRules {
    /// Rules-table version, bumped whenever rates or ratios change.
    #[serde(default = "default_rules_version")]
    pub version: u32,
    /// Optional stability band: keep each headcount within this fraction of
    /// the current roster. Off by default; enabling it can make otherwise
    /// feasible demand profiles infeasible, which is reported, not relaxed.
    #[serde(default)]
    pub max_change_fraction: Option<f64>,
    /// Hourly cost per staff member by category and shift.
    #[serde(default = "default_hourly_rates")]
    pub hourly_rates: BTreeMap<StaffCategory, BTreeMap<Shift, f64>>,
    /// Predicted occupied beds one nurse can cover, per shift.
    #[serde(default = "default_patients_per_nurse")]
    pub patients_per_nurse: BTreeMap<Shift, f64>,
    /// Predicted admissions one doctor can absorb, per shift.
    #[serde(default = "default_admissions_per_doctor")]
    pub admissions_per_doctor: BTreeMap<Shift, f64>,
    /// Combined activity (admissions + occupancy) one support worker covers.
    #[serde(default = "default_activity_per_support")]
    pub activity_per_support: BTreeMap<Shift, f64>,
    /// Demand-independent headcount floors.
    #[serde(default = "default_shift_floors")]
    pub shift_floors: BTreeMap<StaffCategory, BTreeMap<Shift, u32>>,
    /// Relative coverage contribution of one staff member by category.
    #[serde(default = "default_coverage_weights")]
    pub coverage_weights: BTreeMap<StaffCategory, f64>,
    /// Occupied beds one weighted coverage unit absorbs, per shift.
    #[serde(default = "default_coverage_beds_per_unit")]
    pub coverage_beds_per_unit: BTreeMap<Shift, f64>,
    /// Default per-variable headcount bounds when a request has no override.
    #[serde(default = "default_headcount_bounds")]
    pub default_bounds: HeadcountBounds,
}

fn default_rules_version() -> u32 {
    1
}

fn default_hourly_rates() -> BTreeMap<StaffCategory, BTreeMap<Shift, f64>> {
    let mut rates = BTreeMap::new();
    rates.insert(
        StaffCategory::Nurses,
        BTreeMap::from([(Shift::Morning, 25.0), (Shift::Evening, 28.0), (Shift::Night, 32.0)]),
    );
    rates.insert(
        StaffCategory::Doctors,
        BTreeMap::from([(Shift::Morning, 80.0), (Shift::Evening, 85.0), (Shift::Night, 95.0)]),
    );
    rates.insert(
        StaffCategory::Support,
        BTreeMap::from([(Shift::Morning, 18.0), (Shift::Evening, 20.0), (Shift::Night, 25.0)]),
    );
    rates
}

fn default_patients_per_nurse() -> BTreeMap<Shift, f64> {
    BTreeMap::from([(Shift::Morning, 6.0), (Shift::Evening, 8.0), (Shift::Night, 12.0)])
}

fn default_admissions_per_doctor() -> BTreeMap<Shift, f64> {
    BTreeMap::from([(Shift::Morning, 1.2), (Shift::Evening, 1.4), (Shift::Night, 2.8)])
}

fn default_activity_per_support() -> BTreeMap<Shift, f64> {
    BTreeMap::from([(Shift::Morning, 25.0), (Shift::Evening, 32.0), (Shift::Night, 50.0)])
}

fn default_shift_floors() -> BTreeMap<StaffCategory, BTreeMap<Shift, u32>> {
    let mut floors = BTreeMap::new();
    floors.insert(
        StaffCategory::Nurses,
        BTreeMap::from([(Shift::Morning, 3), (Shift::Evening, 3), (Shift::Night, 10)]),
    );
    floors.insert(
        StaffCategory::Doctors,
        BTreeMap::from([(Shift::Morning, 2), (Shift::Evening, 2), (Shift::Night, 5)]),
    );
    floors.insert(
        StaffCategory::Support,
        BTreeMap::from([(Shift::Morning, 1), (Shift::Evening, 1), (Shift::Night, 1)]),
    );
    floors
}

fn default_coverage_weights() -> BTreeMap<StaffCategory, f64> {
    BTreeMap::from([
        (StaffCategory::Nurses, 1.0),
        (StaffCategory::Doctors, 1.5),
        (StaffCategory::Support, 0.5),
    ])
}

fn default_coverage_beds_per_unit() -> BTreeMap<Shift, f64> {
    BTreeMap::from([(Shift::Morning, 5.0), (Shift::Evening, 6.0), (Shift::Night, 8.0)])
}

fn default_headcount_bounds() -> HeadcountBounds {
    HeadcountBounds { min: 1, max: 50 }
}

impl Default for StaffingRules {
    fn default() -> Self {
        Self {
            version: default_rules_version(),
            max_change_fraction: None,
            hourly_rates: default_hourly_rates(),
            patients_per_nurse: default_patients_per_nurse(),
            admissions_per_doctor: default_admissions_per_doctor(),
            activity_per_support: default_activity_per_support(),
            shift_floors: default_shift_floors(),
            coverage_weights: default_coverage_weights(),
            coverage_beds_per_unit: default_coverage_beds_per_unit(),
            default_bounds: default_headcount_bounds(),
        }
    }
}

impl StaffingRules {
    /// Load staffing rules from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse staffing rules from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Hourly rate for one slot; unknown slots cost nothing.
    pub fn rate(&self, category: StaffCategory, shift: Shift) -> f64 {
        self.hourly_rates
            .get(&category)
            .and_then(|shifts| shifts.get(&shift))
            .copied()
            .unwrap_or(0.0)
    }

    /// Demand-independent floor for one slot.
    pub fn floor(&self, category: StaffCategory, shift: Shift) -> u32 {
        self.shift_floors
            .get(&category)
            .and_then(|shifts| shifts.get(&shift))
            .copied()
            .unwrap_or(0)
    }

    /// Coverage weight for one category.
    pub fn weight(&self, category: StaffCategory) -> f64 {
        self.coverage_weights.get(&category).copied().unwrap_or(0.0)
    }
}

/// Feature-construction and training knobs for the forecast pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSettings {
    /// Lag offsets in hours, looked up backwards from the reference time.
    #[serde(default = "default_lag_hours")]
    pub lag_hours: Vec<i64>,
    /// Rolling-statistic window lengths in hours.
    #[serde(default = "default_rolling_windows")]
    pub rolling_window_hours: Vec<i64>,
    /// Fraction of labeled rows used as the chronological training prefix.
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    /// Ridge regularization strength.
    #[serde(default = "default_ridge_lambda")]
    pub ridge_lambda: f64,
    /// Minimum labeled rows required before a fit is attempted.
    #[serde(default = "default_min_training_rows")]
    pub min_training_rows: usize,
}

fn default_lag_hours() -> Vec<i64> {
    vec![1, 24, 168]
}

fn default_rolling_windows() -> Vec<i64> {
    vec![6, 24]
}

fn default_train_fraction() -> f64 {
    0.8
}

fn default_ridge_lambda() -> f64 {
    1e-3
}

fn default_min_training_rows() -> usize {
    50
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            lag_hours: default_lag_hours(),
            rolling_window_hours: default_rolling_windows(),
            train_fraction: default_train_fraction(),
            ridge_lambda: default_ridge_lambda(),
            min_training_rows: default_min_training_rows(),
        }
    }
}

impl ForecastSettings {
    /// Longest backward-looking window any feature needs, in hours.
    pub fn max_lookback_hours(&self) -> i64 {
        self.lag_hours
            .iter()
            .chain(self.rolling_window_hours.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_cover_all_slots() {
        let rules = StaffingRules::default();
        for category in StaffCategory::ALL {
            for shift in Shift::ALL {
                assert!(rules.rate(category, shift) > 0.0);
            }
            assert!(rules.weight(category) > 0.0);
        }
        assert_eq!(rules.version, 1);
        assert!(rules.max_change_fraction.is_none());
    }

    #[test]
    fn test_nurse_rates_below_doctor_rates() {
        let rules = StaffingRules::default();
        for shift in Shift::ALL {
            assert!(
                rules.rate(StaffCategory::Nurses, shift) < rules.rate(StaffCategory::Doctors, shift)
            );
        }
    }

    #[test]
    fn test_rules_toml_round_trip() {
        let rules = StaffingRules::default();
        let encoded = toml::to_string(&rules).unwrap();
        let decoded = StaffingRules::from_toml_str(&encoded).unwrap();
        assert_eq!(decoded, rules);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let rules = StaffingRules::from_toml_str("version = 7\n").unwrap();
        assert_eq!(rules.version, 7);
        assert_eq!(rules.rate(StaffCategory::Nurses, Shift::Morning), 25.0);
    }

    #[test]
    fn test_forecast_settings_lookback() {
        let settings = ForecastSettings::default();
        assert_eq!(settings.max_lookback_hours(), 168);
    }
}
