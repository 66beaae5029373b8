use std::path::PathBuf;
use thiserror::Error;

/// Custom Result type for this crate.
pub type Result<T> = std::result::Result<T, LoaderError>;

/// Enum representing all possible errors in the dict_loader library.
#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input file not found: {0}")]
    InputFileNotFound(PathBuf),

    #[error("Database not found: {0}")]
    StoreNotFound(PathBuf),

    #[error("Invalid input document: {0}")]
    InvalidInput(String),

    #[error("Missing field '{field}' in {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("Ingestion cancelled")]
    Cancelled,
}
