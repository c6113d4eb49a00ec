use mailveil_profiles::{ProfileError, RecordError};
use mailveil_store::{BatchError, StoreError};
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors from the reconciliation engine and panel.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A store read or write failed outside a batch.
    #[error("store access failed: {0}")]
    StoreAccess(#[from] StoreError),

    /// A batch commit failed; see [`BatchError::store_restored`].
    #[error("preference commit failed: {0}")]
    Commit(#[from] BatchError),

    /// The selection cannot be applied; nothing was written.
    #[error("invalid selection: {0}")]
    InvalidSelection(#[from] ProfileError),

    #[error("localized message missing: {0}")]
    LocalizationMissing(String),

    #[error("unknown account: {0}")]
    UnknownAccount(String),

    #[error("collaborator failed: {0}")]
    Collaborator(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("engine lock poisoned")]
    Poisoned,
}

impl From<RecordError> for EngineError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Store(err) => EngineError::StoreAccess(err),
            RecordError::Profile(err) => EngineError::InvalidSelection(err),
        }
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl EngineError {
    /// Store failures: the caller may retry with the last known-good selection.
    pub fn is_store_access(&self) -> bool {
        matches!(self, EngineError::StoreAccess(_) | EngineError::Commit(_))
    }

    pub fn is_invalid_selection(&self) -> bool {
        matches!(self, EngineError::InvalidSelection(_))
    }
}
