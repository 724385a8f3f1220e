use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use schemafit_core::GroundTruthRecord;

/// Failure to use a ground-truth file that does exist.
///
/// A missing file is not an error; see [`GroundTruthStore::load`].
#[derive(Debug, Error)]
pub enum GroundTruthError {
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed ground truth in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// File-backed ground truth, one JSON file per table.
#[derive(Debug, Clone)]
pub struct GroundTruthStore {
    dir: PathBuf,
}

impl GroundTruthStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file expected to hold `table`'s records.
    pub fn file_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}_gt.json"))
    }

    /// Load the expected matches for `table`.
    ///
    /// `Ok(None)` means no ground truth exists for the table; callers must
    /// treat that as "nothing to score", not as a failure. Files are
    /// re-read on every call.
    pub fn load(&self, table: &str) -> Result<Option<Vec<GroundTruthRecord>>, GroundTruthError> {
        let path = self.file_path(table);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path).map_err(|source| GroundTruthError::Io {
            path: path.clone(),
            source,
        })?;
        let records = serde_json::from_str(&contents)
            .map_err(|source| GroundTruthError::Malformed { path, source })?;
        Ok(Some(records))
    }
}

/// Index records by `original_column`. On duplicates the last record wins.
pub fn index_by_column(records: Vec<GroundTruthRecord>) -> HashMap<String, GroundTruthRecord> {
    let mut index = HashMap::with_capacity(records.len());
    for record in records {
        index.insert(record.original_column.clone(), record);
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    fn write_file(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).expect("write fixture");
    }

    #[test]
    fn missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = GroundTruthStore::new(dir.path());
        let loaded = store.load("unknown_table").expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn loads_records_from_table_named_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(
            dir.path(),
            "customers_gt.json",
            r#"[{"original_column": "user_name", "fitted_column": "username", "fitted_schema": "schema_001"}]"#,
        );

        let store = GroundTruthStore::new(dir.path());
        let records = store.load("customers").expect("load").expect("present");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].original_column, "user_name");
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_file(dir.path(), "orders_gt.json", "{ not json ]");

        let store = GroundTruthStore::new(dir.path());
        let err = store.load("orders").expect_err("malformed");
        assert!(matches!(err, GroundTruthError::Malformed { .. }));
        assert!(err.to_string().contains("orders_gt.json"));
    }

    #[test]
    fn duplicate_columns_keep_the_last_record() {
        let records = vec![
            GroundTruthRecord {
                original_column: "user_name".to_string(),
                fitted_column: Some("username".to_string()),
                fitted_schema: Some("schema_001".to_string()),
                explanation: None,
            },
            GroundTruthRecord {
                original_column: "user_name".to_string(),
                fitted_column: Some("login".to_string()),
                fitted_schema: Some("schema_002".to_string()),
                explanation: None,
            },
        ];

        let index = index_by_column(records);
        assert_eq!(index.len(), 1);
        assert_eq!(index["user_name"].fitted_column.as_deref(), Some("login"));
    }
}
