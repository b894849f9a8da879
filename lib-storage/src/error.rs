use thiserror::Error;

/// Storage engine failures. Database-level errors are fatal: the node
/// cannot make progress without durable storage, so callers do not retry.
#[derive(Error, Debug, Clone)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),

    #[error("corrupted data for key: {0}")]
    CorruptedData(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
