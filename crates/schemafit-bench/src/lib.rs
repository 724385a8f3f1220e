//! Benchmarking and statistics for schemafit pipelines.
//!
//! Stored predictions are joined against per-table ground truth, folded
//! into accuracy metrics at global and per-environment granularity, and
//! optionally persisted as append-only benchmark runs.

pub mod aggregate;
pub mod compare;
pub mod ground_truth;
pub mod recorder;
pub mod statistics;

pub use aggregate::{AggregateOutcome, EnvSummary, MetricsSummary, WrongMatch, aggregate};
pub use compare::{MatchOutcome, compare};
pub use ground_truth::{GroundTruthError, GroundTruthStore, index_by_column};
pub use recorder::{BenchmarkReceipt, BenchmarkRecorder, new_run_id};
pub use statistics::{PipelineStatistics, StatisticsService};
