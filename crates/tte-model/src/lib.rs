//! Data model for time-to-event derivation.
//!
//! This crate holds the typed vocabulary shared by the engine and the CLI:
//!
//! - **config**: [`AnalysisConfig`] and [`EventGroup`], the structured analysis definition
//! - **catalog**: [`ColumnCatalog`], the validated column set with its global priority order
//! - **span**: [`TimeSpan`], fixed-length durations parsed from text
//! - **observation**: [`DateObservation`] and [`Aggregation`]
//! - **subject**: [`SubjectId`]
//! - **error**: [`ConfigError`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod observation;
pub mod span;
pub mod subject;

pub use catalog::{ColumnCatalog, ColumnRole, Outcome, OutcomeLevels, PriorityRank, SourceColumn};
pub use config::{AnalysisConfig, DIAGNOSTIC_COLUMNS, EventGroup};
pub use error::ConfigError;
pub use observation::{Aggregation, DateObservation};
pub use span::TimeSpan;
pub use subject::SubjectId;

/// Reserved outcome label for censoring observations.
pub const CENSORED: &str = "Censored";
