use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use schemafit_core::{BenchmarkRun, EnvBenchmarkRun, Error, PredictionRecord, Result};

mod queries;

pub use queries::EnvBenchmarkRow;

/// Handle over the relational store that owns prediction and benchmark rows.
///
/// Cloning is cheap; clones share the underlying pool. Connections are
/// acquired per statement and released when the statement completes.
#[derive(Debug, Clone)]
pub struct PredictionStore {
    pool: PgPool,
}

impl PredictionStore {
    /// Wrap an existing pool. Creating the backing tables is the caller's
    /// responsibility; see [`PredictionStore::ensure_schema`].
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to Postgres and create the backing tables when absent.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await
            .map_err(|err| Error::Storage(err.to_string()))?;

        let store = Self::new(pool);
        store.ensure_schema().await?;
        tracing::info!(event = "store_connected");
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the prediction and benchmark tables when they do not exist.
    pub async fn ensure_schema(&self) -> Result<()> {
        queries::ensure_schema(&self.pool).await
    }

    /// Append one prediction row. Used by the ingest path after pipeline
    /// execution; never updates existing rows.
    pub async fn insert_prediction(&self, record: &PredictionRecord) -> Result<()> {
        queries::insert_prediction(&self.pool, record).await
    }

    /// Every stored prediction for a pipeline, ordered by job then insert
    /// time.
    pub async fn predictions_for_pipeline(
        &self,
        pipeline_name: &str,
    ) -> Result<Vec<PredictionRecord>> {
        queries::predictions_for_pipeline(&self.pool, pipeline_name).await
    }

    /// Distinct pipeline names present in the prediction table.
    pub async fn distinct_pipeline_names(&self) -> Result<Vec<String>> {
        queries::distinct_pipeline_names(&self.pool).await
    }

    /// Append one global benchmark run row.
    pub async fn insert_benchmark_run(&self, run: &BenchmarkRun) -> Result<()> {
        queries::insert_benchmark_run(&self.pool, run).await
    }

    /// Append one per-environment benchmark run row.
    pub async fn insert_env_benchmark_run(&self, run: &EnvBenchmarkRun) -> Result<()> {
        queries::insert_env_benchmark_run(&self.pool, run).await
    }

    /// Per-environment benchmark rows for a pipeline, newest first,
    /// optionally restricted to one environment.
    pub async fn env_benchmark_history(
        &self,
        pipeline_name: &str,
        env_id: Option<&str>,
    ) -> Result<Vec<EnvBenchmarkRow>> {
        queries::env_benchmark_history(&self.pool, pipeline_name, env_id).await
    }

    /// Close the pool, waiting for in-flight statements to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
