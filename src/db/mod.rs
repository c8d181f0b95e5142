//! Storage module for the historical series and persisted models.
//!
//! Follows the repository pattern: the forecasting core consumes the
//! [`repository::HistoryRepository`] and [`repository::ModelRepository`]
//! traits and never touches a concrete backend. The in-memory
//! [`LocalRepository`] backs tests, local development, and single-process
//! deployments; additional backends implement the same traits.
//!
//! The historical series is read-only to the core: feature construction and
//! training consume ordered samples, and only the data-source collaborators
//! (synthetic generation, ingestion) write. Repositories are constructed at
//! startup and injected as `Arc`s; there is no process-global instance, so
//! tests can substitute fixtures without side effects.

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod checksum;
pub mod repositories;
pub mod repository;

pub use checksum::calculate_checksum;
#[cfg(feature = "local-repo")]
pub use repositories::LocalRepository;
pub use repository::{
    FullRepository, HistoryRepository, ModelRepository, RepositoryError, RepositoryResult,
};
