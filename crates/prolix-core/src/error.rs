//! Error types for Prolix.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the caller can re-prompt and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::InvalidQuery(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
