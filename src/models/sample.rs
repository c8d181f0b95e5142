//! Core time-series vocabulary: samples, forecast targets, and horizons.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One hourly observation of hospital state.
///
/// Samples are ordered by timestamp with no duplicates; the repository owns
/// them and the forecasting core only ever reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub timestamp: DateTime<Utc>,
    /// Patients admitted during this hour.
    pub admissions: f64,
    /// Patients discharged during this hour.
    pub discharges: f64,
    /// Occupied beds at the end of the hour.
    pub bed_occupancy: f64,
    /// Oxygen reserve in liters.
    pub oxygen_level: f64,
    /// Occupied beds as a percentage of total capacity.
    pub occupancy_rate: f64,
}

impl TimeSeriesSample {
    /// Read the series value for a forecast target.
    pub fn value(&self, target: Target) -> f64 {
        match target {
            Target::Admissions => self.admissions,
            Target::BedOccupancy => self.bed_occupancy,
            Target::OxygenLevel => self.oxygen_level,
        }
    }
}

/// A forecastable resource series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    Admissions,
    BedOccupancy,
    OxygenLevel,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::Admissions, Target::BedOccupancy, Target::OxygenLevel];

    pub fn as_str(&self) -> &'static str {
        match self {
            Target::Admissions => "admissions",
            Target::BedOccupancy => "bed_occupancy",
            Target::OxygenLevel => "oxygen_level",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admissions" => Ok(Target::Admissions),
            "bed_occupancy" => Ok(Target::BedOccupancy),
            "oxygen_level" => Ok(Target::OxygenLevel),
            other => Err(UnknownNameError {
                kind: "target",
                name: other.to_string(),
            }),
        }
    }
}

/// Forecast lead time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Horizon {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::OneHour, Horizon::SixHours, Horizon::TwentyFourHours];

    /// Lead time in whole hours.
    pub fn hours(&self) -> i64 {
        match self {
            Horizon::OneHour => 1,
            Horizon::SixHours => 6,
            Horizon::TwentyFourHours => 24,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneHour => "1h",
            Horizon::SixHours => "6h",
            Horizon::TwentyFourHours => "24h",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Horizon {
    type Err = UnknownNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Horizon::OneHour),
            "6h" => Ok(Horizon::SixHours),
            "24h" => Ok(Horizon::TwentyFourHours),
            other => Err(UnknownNameError {
                kind: "horizon",
                name: other.to_string(),
            }),
        }
    }
}

/// Tagged (target, horizon) pair identifying exactly one model slot.
///
/// A model trained for one key is never consulted for another; the registry
/// validates the full grid at load time instead of failing at first request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModelKey {
    pub target: Target,
    pub horizon: Horizon,
}

impl ModelKey {
    pub fn new(target: Target, horizon: Horizon) -> Self {
        Self { target, horizon }
    }

    /// The full 3 × 3 grid of supported model slots.
    pub fn grid() -> impl Iterator<Item = ModelKey> {
        Target::ALL.into_iter().flat_map(|target| {
            Horizon::ALL
                .into_iter()
                .map(move |horizon| ModelKey::new(target, horizon))
        })
    }
}

impl fmt::Display for ModelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.target, self.horizon)
    }
}

/// Parse error for target/horizon names supplied by callers.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown {kind} name: '{name}'")]
pub struct UnknownNameError {
    pub kind: &'static str,
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_round_trip() {
        for target in Target::ALL {
            assert_eq!(target.as_str().parse::<Target>().unwrap(), target);
        }
    }

    #[test]
    fn test_horizon_round_trip() {
        for horizon in Horizon::ALL {
            assert_eq!(horizon.label().parse::<Horizon>().unwrap(), horizon);
        }
        assert!("3h".parse::<Horizon>().is_err());
    }

    #[test]
    fn test_model_key_grid_covers_all_pairs() {
        let keys: Vec<ModelKey> = ModelKey::grid().collect();
        assert_eq!(keys.len(), 9);
        for target in Target::ALL {
            for horizon in Horizon::ALL {
                assert!(keys.contains(&ModelKey::new(target, horizon)));
            }
        }
    }

    #[test]
    fn test_horizon_serde_labels() {
        let json = serde_json::to_string(&Horizon::SixHours).unwrap();
        assert_eq!(json, "\"6h\"");
        let parsed: Horizon = serde_json::from_str("\"24h\"").unwrap();
        assert_eq!(parsed, Horizon::TwentyFourHours);
    }
}
