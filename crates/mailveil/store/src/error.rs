use thiserror::Error;

use crate::value::PrefType;

/// Result type for preference store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Preference store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("preference {key} holds a {found} value, expected {expected}")]
    TypeMismatch {
        key: String,
        expected: PrefType,
        found: PrefType,
    },

    #[error("invalid preference key: {0:?}")]
    InvalidKey(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Failure while committing a [`WriteBatch`](crate::WriteBatch).
#[derive(Debug, Error)]
pub enum BatchError {
    /// Prior values could not be captured; nothing was written.
    #[error("could not snapshot prior values: {0}")]
    Snapshot(#[source] StoreError),

    /// A write failed and every touched key was restored.
    #[error("write {index} of {total} failed, batch rolled back: {cause}")]
    Aborted {
        index: usize,
        total: usize,
        #[source]
        cause: StoreError,
    },

    /// A write failed and restoring the prior values failed too.
    #[error("write {index} of {total} failed ({cause}); rollback failed: {rollback}")]
    RollbackFailed {
        index: usize,
        total: usize,
        cause: StoreError,
        rollback: StoreError,
    },
}

impl BatchError {
    /// The store error that aborted the batch.
    pub fn cause(&self) -> &StoreError {
        match self {
            BatchError::Snapshot(cause) => cause,
            BatchError::Aborted { cause, .. } => cause,
            BatchError::RollbackFailed { cause, .. } => cause,
        }
    }

    /// Whether the store was left as it was before the batch.
    pub fn store_restored(&self) -> bool {
        !matches!(self, BatchError::RollbackFailed { .. })
    }
}
