use thiserror::Error;

/// Core error type shared across schemafit crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error: connection, query, or write failure.
    #[error("storage error: {0}")]
    Storage(String),
    /// A ground-truth source exists but cannot be used.
    #[error("ground truth error: {0}")]
    GroundTruth(String),
    /// Configuration that cannot be resolved into a runnable setup.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Catch-all error for unexpected failures.
    #[error("other error: {0}")]
    Other(String),
}

/// Convenience alias for results returned by schemafit crates.
pub type Result<T> = std::result::Result<T, Error>;
