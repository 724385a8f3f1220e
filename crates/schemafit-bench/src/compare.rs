use schemafit_core::{GroundTruthRecord, PredictionRecord, normalized};

/// Correctness of one prediction along the two scored axes.
///
/// A full match requires agreement on both column and schema, so
/// `full_match` implies `schema_match`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchOutcome {
    pub full_match: bool,
    pub schema_match: bool,
}

impl MatchOutcome {
    /// Outcome assigned when ground truth has no entry for the column.
    pub fn miss() -> Self {
        Self {
            full_match: false,
            schema_match: false,
        }
    }
}

/// Compare a prediction to its expected record.
///
/// Both sides go through [`normalized`] first so NULLs and empty strings
/// from different backends compare equal. Equality only, no partial credit.
pub fn compare(predicted: &PredictionRecord, expected: &GroundTruthRecord) -> MatchOutcome {
    let column_match = normalized(predicted.fitted_column.as_deref())
        == normalized(expected.fitted_column.as_deref());
    let schema_match = normalized(predicted.fitted_schema.as_deref())
        == normalized(expected.fitted_schema.as_deref());

    MatchOutcome {
        full_match: column_match && schema_match,
        schema_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(fitted_column: Option<&str>, fitted_schema: Option<&str>) -> PredictionRecord {
        PredictionRecord {
            job_id: "job-1".to_string(),
            table_name: "customers".to_string(),
            pipeline_name: "workflow_v2".to_string(),
            env_id: "env1".to_string(),
            original_column: "user_name".to_string(),
            fitted_column: fitted_column.map(str::to_string),
            fitted_schema: fitted_schema.map(str::to_string),
            explanation: None,
            timestamp: None,
        }
    }

    fn expected(fitted_column: Option<&str>, fitted_schema: Option<&str>) -> GroundTruthRecord {
        GroundTruthRecord {
            original_column: "user_name".to_string(),
            fitted_column: fitted_column.map(str::to_string),
            fitted_schema: fitted_schema.map(str::to_string),
            explanation: None,
        }
    }

    #[test]
    fn record_compared_to_itself_matches_on_both_axes() {
        let outcome = compare(
            &prediction(Some("username"), Some("schema_001")),
            &expected(Some("username"), Some("schema_001")),
        );
        assert!(outcome.full_match);
        assert!(outcome.schema_match);
    }

    #[test]
    fn schema_mismatch_fails_both_axes() {
        let outcome = compare(
            &prediction(Some("username"), Some("schema_001")),
            &expected(Some("username"), Some("schema_002")),
        );
        assert!(!outcome.full_match);
        assert!(!outcome.schema_match);
    }

    #[test]
    fn column_mismatch_alone_still_matches_schema() {
        let outcome = compare(
            &prediction(Some("login"), Some("schema_001")),
            &expected(Some("username"), Some("schema_001")),
        );
        assert!(!outcome.full_match);
        assert!(outcome.schema_match);
    }

    #[test]
    fn null_and_empty_fields_compare_equal() {
        let outcome = compare(&prediction(None, None), &expected(Some(""), Some("")));
        assert!(outcome.full_match);
        assert!(outcome.schema_match);
    }

    #[test]
    fn full_match_implies_schema_match() {
        let cases = [
            (Some("username"), Some("schema_001")),
            (Some("login"), Some("schema_001")),
            (Some("username"), Some("schema_002")),
            (None, None),
        ];
        for (column, schema) in cases {
            let outcome = compare(
                &prediction(column, schema),
                &expected(Some("username"), Some("schema_001")),
            );
            assert!(!outcome.full_match || outcome.schema_match);
        }
    }
}
