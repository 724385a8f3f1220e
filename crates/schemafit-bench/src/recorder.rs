use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use schemafit_core::{BenchmarkRun, EnvBenchmarkRun};
use schemafit_store::PredictionStore;

use crate::aggregate::AggregateOutcome;

/// Receipt for one benchmark recording attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkReceipt {
    pub run_id: String,
    /// False when any row failed to write; the computed metrics are
    /// unaffected.
    pub persisted: bool,
}

/// Time-prefixed, collision-resistant run identifier.
pub fn new_run_id(pipeline_name: &str) -> String {
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    format!("bench_{pipeline_name}_{stamp}_{}", Uuid::new_v4())
}

/// Persists aggregate metrics as append-only benchmark runs.
///
/// Write-only: never reads back what it writes.
#[derive(Debug, Clone)]
pub struct BenchmarkRecorder<'a> {
    store: &'a PredictionStore,
}

impl<'a> BenchmarkRecorder<'a> {
    pub fn new(store: &'a PredictionStore) -> Self {
        Self { store }
    }

    /// Write one global row plus one row per observed environment, all
    /// tagged with a fresh run id. Failed inserts are logged and folded
    /// into the receipt's `persisted` flag; they never propagate.
    pub async fn record(
        &self,
        pipeline_name: &str,
        outcome: &AggregateOutcome,
    ) -> BenchmarkReceipt {
        let run_id = new_run_id(pipeline_name);
        let mut persisted = true;

        let run = BenchmarkRun {
            run_id: run_id.clone(),
            pipeline_name: pipeline_name.to_string(),
            accuracy: outcome.summary.accuracy,
            schema_accuracy: outcome.summary.schema_accuracy,
            total_tests: outcome.summary.total_tests as i64,
        };
        if let Err(err) = self.store.insert_benchmark_run(&run).await {
            warn!(pipeline = %pipeline_name, error = %err, "failed to persist benchmark run");
            persisted = false;
        }

        for (env_id, env) in &outcome.env_summaries {
            let run = EnvBenchmarkRun {
                run_id: run_id.clone(),
                pipeline_name: pipeline_name.to_string(),
                env_id: env_id.clone(),
                accuracy: env.accuracy,
                schema_accuracy: env.schema_accuracy,
                total_tests: env.total_tests as i64,
            };
            if let Err(err) = self.store.insert_env_benchmark_run(&run).await {
                warn!(
                    pipeline = %pipeline_name,
                    env = %env_id,
                    error = %err,
                    "failed to persist env benchmark run"
                );
                persisted = false;
            }
        }

        if persisted {
            info!(pipeline = %pipeline_name, run_id = %run_id, "benchmark run recorded");
        }

        BenchmarkReceipt { run_id, persisted }
    }
}
