//! Service layer for business logic and orchestration.
//!
//! Services sit between the repository layer and the HTTP API: feature
//! construction, model training and inference, the forecast pipeline, the
//! staff optimizer, and synthetic data generation.

pub mod feature_builder;

pub mod forecast;

#[cfg(feature = "http-server")]
pub mod job_tracker;

pub mod optimizer;

pub mod registry;

pub mod synthetic;

pub mod training;

pub use feature_builder::{FeatureBuilder, FeatureError};
pub use forecast::{ForecastError, ForecastService};
pub use optimizer::StaffOptimizer;
pub use registry::ModelRegistry;
pub use synthetic::SyntheticGenerator;
pub use training::{predict, train_model};
