use mailveil_store::StoreError;
use thiserror::Error;

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;

/// Errors raised while interpreting a profile selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    #[error("unknown profile kind index: {0}")]
    UnknownKind(i64),

    #[error("unknown anonymization variant index: {0}")]
    UnknownVariant(i64),

    #[error("unknown profile kind name: {0}")]
    UnknownKindName(String),

    #[error("unknown anonymization variant name: {0}")]
    UnknownVariantName(String),

    #[error("custom profile requires a proxy endpoint")]
    MissingEndpoint,

    #[error("invalid proxy endpoint {host:?}:{port}: {reason}")]
    InvalidEndpoint {
        host: String,
        port: i64,
        reason: String,
    },
}

/// Failure reading a typed record back from the store.
#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Profile(#[from] ProfileError),
}
