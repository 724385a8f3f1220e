use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use schemafit_core::Result;
use schemafit_store::{EnvBenchmarkRow, PredictionStore};

use crate::aggregate::{AggregateOutcome, EnvSummary, MetricsSummary, aggregate};
use crate::ground_truth::GroundTruthStore;
use crate::recorder::BenchmarkRecorder;

/// Combined result of one statistics computation for a pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStatistics {
    pub pipeline_name: String,
    pub summary: MetricsSummary,
    pub env_summaries: BTreeMap<String, EnvSummary>,
    /// Run id of the benchmark rows written for this computation, when
    /// recording was attempted.
    pub run_id: Option<String>,
    /// False when recording was skipped or any row failed to write.
    pub persisted: bool,
}

/// Entry points for pipeline statistics.
///
/// Both handles are injected; every call re-reads storage and the
/// ground-truth files, trading repeated I/O for freshness.
#[derive(Debug, Clone)]
pub struct StatisticsService {
    store: PredictionStore,
    ground_truth: GroundTruthStore,
    persist: bool,
}

impl StatisticsService {
    pub fn new(store: PredictionStore, ground_truth: GroundTruthStore) -> Self {
        Self {
            store,
            ground_truth,
            persist: true,
        }
    }

    /// Disable benchmark-run recording; metrics are still computed.
    pub fn without_persistence(mut self) -> Self {
        self.persist = false;
        self
    }

    /// Distinct pipeline names currently present in storage.
    pub async fn pipeline_names(&self) -> Result<Vec<String>> {
        self.store.distinct_pipeline_names().await
    }

    /// Fetch, score and (best-effort) record statistics for one pipeline.
    ///
    /// A pipeline with zero stored predictions yields a zeroed summary and
    /// no benchmark rows, never an error.
    pub async fn pipeline_statistics(&self, pipeline_name: &str) -> Result<PipelineStatistics> {
        info!(pipeline = %pipeline_name, "calculating pipeline statistics");
        let records = self.store.predictions_for_pipeline(pipeline_name).await?;

        if records.is_empty() {
            warn!(pipeline = %pipeline_name, "no stored predictions");
            return Ok(PipelineStatistics {
                pipeline_name: pipeline_name.to_string(),
                summary: MetricsSummary::zeroed(),
                env_summaries: BTreeMap::new(),
                run_id: None,
                persisted: false,
            });
        }

        let outcome = aggregate(&records, &self.ground_truth);

        let (run_id, persisted) = if self.persist {
            let receipt = BenchmarkRecorder::new(&self.store)
                .record(pipeline_name, &outcome)
                .await;
            (Some(receipt.run_id), receipt.persisted)
        } else {
            (None, false)
        };

        let AggregateOutcome {
            summary,
            env_summaries,
        } = outcome;
        info!(
            pipeline = %pipeline_name,
            total_tests = summary.total_tests,
            accuracy = summary.accuracy,
            schema_accuracy = summary.schema_accuracy,
            "pipeline statistics ready"
        );

        Ok(PipelineStatistics {
            pipeline_name: pipeline_name.to_string(),
            summary,
            env_summaries,
            run_id,
            persisted,
        })
    }

    /// Statistics for every pipeline present in storage.
    pub async fn all_statistics(&self) -> Result<BTreeMap<String, PipelineStatistics>> {
        let names = self.store.distinct_pipeline_names().await?;
        info!(count = names.len(), "calculating statistics for stored pipelines");
        self.statistics_for_names(&names).await
    }

    /// Statistics for a fixed list of pipelines, skipping discovery.
    pub async fn all_statistics_for(
        &self,
        pipelines: &[String],
    ) -> Result<BTreeMap<String, PipelineStatistics>> {
        self.statistics_for_names(pipelines).await
    }

    async fn statistics_for_names(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, PipelineStatistics>> {
        let mut all = BTreeMap::new();
        for name in names {
            let stats = self.pipeline_statistics(name).await?;
            all.insert(name.clone(), stats);
        }
        Ok(all)
    }

    /// Most recent persisted per-environment benchmark row for each
    /// `(pipeline, environment)` pair. Pipelines without persisted
    /// per-environment rows are omitted.
    pub async fn latest_env_statistics(
        &self,
        pipelines: &[String],
    ) -> Result<BTreeMap<String, BTreeMap<String, EnvBenchmarkRow>>> {
        let mut all = BTreeMap::new();
        for pipeline in pipelines {
            let rows = self.store.env_benchmark_history(pipeline, None).await?;

            // Rows come back newest first; keep the first one per env.
            let mut latest: BTreeMap<String, EnvBenchmarkRow> = BTreeMap::new();
            for row in rows {
                latest.entry(row.env_id.clone()).or_insert(row);
            }

            if !latest.is_empty() {
                all.insert(pipeline.clone(), latest);
            }
        }
        Ok(all)
    }
}
