use std::fs;
use std::path::Path;

use schemafit_bench::{GroundTruthStore, aggregate};
use schemafit_core::{NOT_FOUND, PredictionRecord};
use tempfile::TempDir;

fn prediction(
    job_id: &str,
    table_name: &str,
    env_id: &str,
    original_column: &str,
    fitted_column: &str,
    fitted_schema: &str,
) -> PredictionRecord {
    PredictionRecord {
        job_id: job_id.to_string(),
        table_name: table_name.to_string(),
        pipeline_name: "workflow_v2".to_string(),
        env_id: env_id.to_string(),
        original_column: original_column.to_string(),
        fitted_column: Some(fitted_column.to_string()),
        fitted_schema: Some(fitted_schema.to_string()),
        explanation: Some("matched by header similarity".to_string()),
        timestamp: None,
    }
}

fn write_ground_truth(dir: &Path, table: &str, contents: &str) {
    fs::write(dir.join(format!("{table}_gt.json")), contents).expect("write ground truth");
}

fn store_with(entries: &[(&str, &str)]) -> (TempDir, GroundTruthStore) {
    let dir = tempfile::tempdir().expect("tempdir");
    for (table, contents) in entries {
        write_ground_truth(dir.path(), table, contents);
    }
    let store = GroundTruthStore::new(dir.path());
    (dir, store)
}

#[test]
fn no_predictions_yield_a_zeroed_summary() {
    let (_dir, store) = store_with(&[]);
    let outcome = aggregate(&[], &store);

    assert_eq!(outcome.summary.accuracy, 0.0);
    assert_eq!(outcome.summary.schema_accuracy, 0.0);
    assert_eq!(outcome.summary.total_tests, 0);
    assert!(outcome.summary.wrong_matches.is_empty());
    assert!(outcome.env_summaries.is_empty());
}

#[test]
fn exact_match_scores_full_accuracy() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"}]"#,
    )]);
    let records = vec![prediction(
        "job-1",
        "customers",
        "env1",
        "user_name",
        "username",
        "schema_001",
    )];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 1.0);
    assert_eq!(outcome.summary.schema_accuracy, 1.0);
    assert_eq!(outcome.summary.total_tests, 1);
    assert!(outcome.summary.wrong_matches.is_empty());
}

#[test]
fn schema_disagreement_fails_both_metrics() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_002"}]"#,
    )]);
    let records = vec![prediction(
        "job-1",
        "customers",
        "env1",
        "user_name",
        "username",
        "schema_001",
    )];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 0.0);
    assert_eq!(outcome.summary.schema_accuracy, 0.0);
    assert_eq!(outcome.summary.total_tests, 1);
    assert_eq!(outcome.summary.wrong_matches.len(), 1);

    let wrong = &outcome.summary.wrong_matches[0];
    assert_eq!(wrong.predicted_fitted_schema, "schema_001");
    assert_eq!(wrong.expected_fitted_schema, "schema_002");
}

#[test]
fn half_correct_predictions_score_half() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[
          {"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"},
          {"original_column": "mail", "fitted_column": "email", "fitted_schema": "schema_001"}
        ]"#,
    )]);
    let records = vec![
        prediction("job-1", "customers", "env1", "user_name", "username", "schema_001"),
        // Column agrees, schema does not.
        prediction("job-1", "customers", "env1", "mail", "email", "schema_002"),
    ];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 0.5);
    assert_eq!(outcome.summary.schema_accuracy, 0.5);
    assert_eq!(outcome.summary.total_tests, 2);
    assert_eq!(outcome.summary.wrong_matches.len(), 1);
}

#[test]
fn column_missing_from_ground_truth_counts_as_wrong() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"}]"#,
    )]);
    let records = vec![prediction(
        "job-1",
        "customers",
        "env1",
        "unlisted_column",
        "guess",
        "schema_001",
    )];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 0.0);
    assert_eq!(outcome.summary.schema_accuracy, 0.0);
    assert_eq!(outcome.summary.total_tests, 1);
    assert_eq!(outcome.summary.wrong_matches.len(), 1);

    let wrong = &outcome.summary.wrong_matches[0];
    assert_eq!(wrong.expected_fitted_column, NOT_FOUND);
    assert_eq!(wrong.expected_fitted_schema, NOT_FOUND);
    assert_eq!(wrong.predicted_fitted_column, "guess");
}

#[test]
fn table_without_ground_truth_file_contributes_nothing() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"}]"#,
    )]);
    let records = vec![
        prediction("job-1", "customers", "env1", "user_name", "username", "schema_001"),
        prediction("job-2", "orders", "env1", "order_no", "order_number", "schema_001"),
        prediction("job-2", "orders", "env1", "qty", "quantity", "schema_001"),
    ];

    let outcome = aggregate(&records, &store);
    // Only the customers job is evaluated; both orders rows are skipped.
    assert_eq!(outcome.summary.total_tests, 1);
    assert_eq!(outcome.summary.accuracy, 1.0);
    assert!(outcome.summary.wrong_matches.is_empty());
}

#[test]
fn malformed_ground_truth_skips_only_that_table() {
    let (_dir, store) = store_with(&[
        (
            "customers",
            r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"}]"#,
        ),
        ("orders", "{ this is not json ]"),
    ]);
    let records = vec![
        prediction("job-1", "customers", "env1", "user_name", "username", "schema_001"),
        prediction("job-2", "orders", "env1", "order_no", "order_number", "schema_001"),
    ];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.total_tests, 1);
    assert_eq!(outcome.summary.accuracy, 1.0);
    assert!(outcome.summary.wrong_matches.is_empty());
}

#[test]
fn environments_are_tallied_independently() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[
          {"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"},
          {"original_column": "mail", "fitted_column": "email", "fitted_schema": "schema_001"}
        ]"#,
    )]);
    let records = vec![
        prediction("job-1", "customers", "env1", "user_name", "username", "schema_001"),
        prediction("job-2", "customers", "env2", "mail", "postal_code", "schema_002"),
    ];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 0.5);
    assert_eq!(outcome.summary.total_tests, 2);

    let env1 = &outcome.env_summaries["env1"];
    assert_eq!(env1.accuracy, 1.0);
    assert_eq!(env1.total_tests, 1);

    let env2 = &outcome.env_summaries["env2"];
    assert_eq!(env2.accuracy, 0.0);
    assert_eq!(env2.total_tests, 1);
}

#[test]
fn aggregate_accuracy_never_exceeds_schema_accuracy() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[
          {"original_column": "a", "fitted_column": "col_a", "fitted_schema": "schema_001"},
          {"original_column": "b", "fitted_column": "col_b", "fitted_schema": "schema_001"},
          {"original_column": "c", "fitted_column": "col_c", "fitted_schema": "schema_001"}
        ]"#,
    )]);
    let records = vec![
        prediction("job-1", "customers", "env1", "a", "col_a", "schema_001"),
        prediction("job-1", "customers", "env1", "b", "wrong", "schema_001"),
        prediction("job-1", "customers", "env1", "c", "col_c", "schema_002"),
        prediction("job-1", "customers", "env1", "d", "ghost", "schema_001"),
    ];

    let outcome = aggregate(&records, &store);
    assert!(outcome.summary.accuracy <= outcome.summary.schema_accuracy);
    assert_eq!(outcome.summary.total_tests, 4);
    for env in outcome.env_summaries.values() {
        assert!(env.accuracy <= env.schema_accuracy);
    }
}

#[test]
fn duplicate_ground_truth_columns_use_the_last_entry() {
    let (_dir, store) = store_with(&[(
        "customers",
        r#"[
          {"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"},
          {"original_column": "user_name", "fitted_column": "login", "fitted_schema": "schema_001"}
        ]"#,
    )]);
    let records = vec![prediction(
        "job-1",
        "customers",
        "env1",
        "user_name",
        "login",
        "schema_001",
    )];

    let outcome = aggregate(&records, &store);
    assert_eq!(outcome.summary.accuracy, 1.0);
    assert!(outcome.summary.wrong_matches.is_empty());
}
