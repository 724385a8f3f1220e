use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Sentinel written into expected fields when ground truth has no entry for
/// a predicted column.
pub const NOT_FOUND: &str = "NOT_FOUND";

/// One column match produced by a pipeline run.
///
/// Rows are append-only: written once by pipeline execution and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PredictionRecord {
    /// Identifier of the pipeline execution that produced this match.
    pub job_id: String,
    /// Source table the matched column came from.
    pub table_name: String,
    /// Matching strategy whose predictions are tracked together.
    pub pipeline_name: String,
    /// Target schema context the column was matched against.
    pub env_id: String,
    /// Column name as found in the source spreadsheet.
    pub original_column: String,
    /// Column the pipeline matched it to, when any.
    pub fitted_column: Option<String>,
    /// Schema the pipeline matched it to, when any.
    pub fitted_schema: Option<String>,
    /// Free-text rationale returned by the matching service.
    pub explanation: Option<String>,
    /// Assigned by storage on insert.
    pub timestamp: Option<DateTime<Utc>>,
}

/// Expected match for one column of a table.
///
/// One set per table, loaded from `<table_name>_gt.json`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct GroundTruthRecord {
    pub original_column: String,
    #[serde(default)]
    pub fitted_column: Option<String>,
    #[serde(default)]
    pub fitted_schema: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Aggregate metrics snapshot persisted for one pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct BenchmarkRun {
    pub run_id: String,
    pub pipeline_name: String,
    /// Fraction of predictions matching ground truth on column and schema.
    pub accuracy: f64,
    /// Fraction of predictions matching ground truth on schema alone.
    pub schema_accuracy: f64,
    pub total_tests: i64,
}

/// Per-environment variant of [`BenchmarkRun`].
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EnvBenchmarkRun {
    pub run_id: String,
    pub pipeline_name: String,
    pub env_id: String,
    pub accuracy: f64,
    pub schema_accuracy: f64,
    pub total_tests: i64,
}

/// Coerce a nullable text field to its comparable form.
///
/// Predictions and ground truth may come from backends that represent a
/// missing value as NULL, an absent key, or the empty string; all of them
/// compare equal after this step.
pub fn normalized(value: Option<&str>) -> &str {
    value.unwrap_or("")
}
