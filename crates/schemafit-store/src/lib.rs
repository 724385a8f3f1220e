//! Postgres-backed storage for schemafit predictions and benchmark runs.
//!
//! The store owns three append-only tables: raw prediction rows written by
//! pipeline execution, global benchmark runs, and per-environment benchmark
//! runs. Callers get a handle per computation; nothing is cached between
//! calls.

mod postgres;

pub use postgres::{EnvBenchmarkRow, PredictionStore};
