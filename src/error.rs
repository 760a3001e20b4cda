//! Error types for loading and querying the subsidy dataset.
//!
//! Startup failures ([`AnalysisError::SourceNotFound`],
//! [`AnalysisError::SchemaError`]) are fatal. Query failures
//! ([`AnalysisError::UnsupportedType`], [`AnalysisError::FieldNotFound`])
//! only abort the query that raised them; the canonical table is never
//! touched.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The raw data file or a lookup file does not exist.
    #[error("Source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// A required column is absent after header normalization.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// The field is backed by a type that is neither numeric nor categorical.
    #[error("Unsupported type '{type_name}' for field '{field}'")]
    UnsupportedType { field: String, type_name: String },

    /// The requested field or metric is not a column of the table.
    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
