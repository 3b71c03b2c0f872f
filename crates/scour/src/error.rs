//! Error types for the scour library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scour operations.
#[derive(Debug, Error)]
pub enum ScourError {
    /// Column is absent from the dataset or has the wrong type for the operation.
    #[error("Invalid column '{column}': {reason}")]
    InvalidColumn { column: String, reason: String },

    /// Unrecognized strategy, method, function or policy name.
    #[error("Invalid {kind} '{name}'")]
    InvalidStrategy { kind: &'static str, name: String },

    /// Caller-supplied bounds are inconsistent.
    #[error("Invalid range for '{column}': {reason}")]
    InvalidRange { column: String, reason: String },

    /// A value could not be converted under the `raise` error policy.
    #[error("Cannot convert '{value}' in column '{column}' (row {row}) to {target}")]
    TypeConversion {
        column: String,
        row: usize,
        value: String,
        target: &'static str,
    },

    /// Operation needs at least one row.
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// A pipeline stage was invoked after an earlier stage failed.
    #[error("Pipeline halted after failed stage '{stage}'")]
    PipelineHalted { stage: String },

    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error parsing CSV/TSV data.
    #[error("Parse error at row {row}, column {column}: {message}")]
    Parse {
        row: usize,
        column: usize,
        message: String,
    },

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScourError {
    pub(crate) fn column_not_found(column: &str) -> Self {
        ScourError::InvalidColumn {
            column: column.to_string(),
            reason: "column not found".to_string(),
        }
    }

    pub(crate) fn wrong_type(column: &str, expected: &str, found: impl std::fmt::Display) -> Self {
        ScourError::InvalidColumn {
            column: column.to_string(),
            reason: format!("expected a {} column, found {}", expected, found),
        }
    }
}

/// Result type alias for scour operations.
pub type Result<T> = std::result::Result<T, ScourError>;
