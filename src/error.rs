//! Error types for Vitals Flux

use thiserror::Error;

/// Errors that can occur during computation
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Inconsistent subject attributes for pet_id: {}", .0.join(", "))]
    InconsistentSubjectAttributes(Vec<String>),

    #[error("Failed to parse recording source: {0}")]
    ParseError(String),

    #[error("Invalid CSV: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
