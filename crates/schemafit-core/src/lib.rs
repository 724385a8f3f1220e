//! Shared data model for the schemafit workspace.
//!
//! Exposes the record types exchanged between the storage, benchmarking and
//! CLI crates, plus the workspace-wide error type.

pub mod error;
pub mod model;

pub use error::{Error, Result};
pub use model::{
    BenchmarkRun, EnvBenchmarkRun, GroundTruthRecord, NOT_FOUND, PredictionRecord, normalized,
};
