use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use schemafit_core::{GroundTruthRecord, NOT_FOUND, PredictionRecord, normalized};

use crate::compare::{MatchOutcome, compare};
use crate::ground_truth::{GroundTruthStore, index_by_column};

/// A prediction that disagrees with ground truth, with enough context to
/// render a diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrongMatch {
    pub job_id: String,
    pub table_name: String,
    pub env_id: String,
    pub original_column: String,
    pub predicted_fitted_column: String,
    pub predicted_fitted_schema: String,
    /// `NOT_FOUND` when ground truth has no entry for the column.
    pub expected_fitted_column: String,
    pub expected_fitted_schema: String,
    pub explanation: Option<String>,
}

impl WrongMatch {
    fn disagreement(prediction: &PredictionRecord, expected: &GroundTruthRecord) -> Self {
        Self {
            job_id: prediction.job_id.clone(),
            table_name: prediction.table_name.clone(),
            env_id: prediction.env_id.clone(),
            original_column: prediction.original_column.clone(),
            predicted_fitted_column: normalized(prediction.fitted_column.as_deref()).to_string(),
            predicted_fitted_schema: normalized(prediction.fitted_schema.as_deref()).to_string(),
            expected_fitted_column: normalized(expected.fitted_column.as_deref()).to_string(),
            expected_fitted_schema: normalized(expected.fitted_schema.as_deref()).to_string(),
            explanation: prediction.explanation.clone(),
        }
    }

    fn unmatched(prediction: &PredictionRecord) -> Self {
        Self {
            job_id: prediction.job_id.clone(),
            table_name: prediction.table_name.clone(),
            env_id: prediction.env_id.clone(),
            original_column: prediction.original_column.clone(),
            predicted_fitted_column: normalized(prediction.fitted_column.as_deref()).to_string(),
            predicted_fitted_schema: normalized(prediction.fitted_schema.as_deref()).to_string(),
            expected_fitted_column: NOT_FOUND.to_string(),
            expected_fitted_schema: NOT_FOUND.to_string(),
            explanation: prediction.explanation.clone(),
        }
    }
}

/// Accuracy figures for one scope of evaluated predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Fraction matching ground truth on column and schema.
    pub accuracy: f64,
    /// Fraction matching ground truth on schema alone.
    pub schema_accuracy: f64,
    pub total_tests: u64,
    pub wrong_matches: Vec<WrongMatch>,
}

impl MetricsSummary {
    /// Summary for a scope with nothing to evaluate.
    pub fn zeroed() -> Self {
        Self {
            accuracy: 0.0,
            schema_accuracy: 0.0,
            total_tests: 0,
            wrong_matches: Vec::new(),
        }
    }
}

/// Per-environment accuracy figures. The global wrong-match list already
/// carries each entry's `env_id`, so none is repeated here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvSummary {
    pub accuracy: f64,
    pub schema_accuracy: f64,
    pub total_tests: u64,
}

/// Output of one aggregation pass over a pipeline's predictions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateOutcome {
    pub summary: MetricsSummary,
    pub env_summaries: BTreeMap<String, EnvSummary>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Tally {
    total: u64,
    full: u64,
    schema: u64,
}

impl Tally {
    fn record(&mut self, outcome: MatchOutcome) {
        self.total += 1;
        if outcome.full_match {
            self.full += 1;
        }
        if outcome.schema_match {
            self.schema += 1;
        }
    }

    fn accuracy(&self) -> f64 {
        if self.total > 0 {
            self.full as f64 / self.total as f64
        } else {
            0.0
        }
    }

    fn schema_accuracy(&self) -> f64 {
        if self.total > 0 {
            self.schema as f64 / self.total as f64
        } else {
            0.0
        }
    }
}

struct JobGroup<'a> {
    table_name: &'a str,
    records: Vec<&'a PredictionRecord>,
}

/// Group predictions by job in first-seen order. The job's table is taken
/// from its first record.
fn group_by_job(records: &[PredictionRecord]) -> Vec<JobGroup<'_>> {
    let mut groups: Vec<JobGroup<'_>> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match index.get(record.job_id.as_str()) {
            Some(&position) => groups[position].records.push(record),
            None => {
                index.insert(record.job_id.as_str(), groups.len());
                groups.push(JobGroup {
                    table_name: record.table_name.as_str(),
                    records: vec![record],
                });
            }
        }
    }

    groups
}

/// Join predictions against ground truth and fold them into accuracy
/// metrics, globally and per environment.
///
/// A table without a ground-truth file contributes nothing: its records are
/// skipped without counting. A column missing from an existing file counts
/// as an evaluated, categorically wrong prediction.
pub fn aggregate(records: &[PredictionRecord], ground_truth: &GroundTruthStore) -> AggregateOutcome {
    let mut global = Tally::default();
    let mut per_env: BTreeMap<String, Tally> = BTreeMap::new();
    let mut wrong_matches = Vec::new();

    for job in group_by_job(records) {
        let loaded = match ground_truth.load(job.table_name) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => {
                warn!(table = %job.table_name, "no ground truth file, skipping table");
                continue;
            }
            Err(err) => {
                error!(table = %job.table_name, error = %err, "unusable ground truth, skipping table");
                continue;
            }
        };
        let index = index_by_column(loaded);

        for prediction in job.records {
            let env_tally = per_env.entry(prediction.env_id.clone()).or_default();

            match index.get(prediction.original_column.as_str()) {
                Some(expected) => {
                    let outcome = compare(prediction, expected);
                    global.record(outcome);
                    env_tally.record(outcome);
                    if !outcome.full_match {
                        wrong_matches.push(WrongMatch::disagreement(prediction, expected));
                    }
                }
                None => {
                    debug!(
                        table = %job.table_name,
                        column = %prediction.original_column,
                        "column absent from ground truth"
                    );
                    let outcome = MatchOutcome::miss();
                    global.record(outcome);
                    env_tally.record(outcome);
                    wrong_matches.push(WrongMatch::unmatched(prediction));
                }
            }
        }
    }

    let env_summaries = per_env
        .into_iter()
        .map(|(env_id, tally)| {
            (
                env_id,
                EnvSummary {
                    accuracy: tally.accuracy(),
                    schema_accuracy: tally.schema_accuracy(),
                    total_tests: tally.total,
                },
            )
        })
        .collect();

    AggregateOutcome {
        summary: MetricsSummary {
            accuracy: global.accuracy(),
            schema_accuracy: global.schema_accuracy(),
            total_tests: global.total,
            wrong_matches,
        },
        env_summaries,
    }
}
