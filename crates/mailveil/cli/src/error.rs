//! CLI error types

use mailveil_engine::EngineError;
use mailveil_store::StoreError;
use thiserror::Error;

/// CLI error type
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Engine(#[from] EngineError),

    #[error("Preference file error: {0}")]
    Store(#[from] StoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
