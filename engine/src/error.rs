//! Error types for the staffsales pipeline.
//!
//! One enum per concern, converted upward with `From` so `?` works across
//! stage boundaries:
//!
//! - [`LoadError`] - reading and decoding CSV input
//! - [`ConfigError`] - loading and checking the JSON configuration
//! - [`StructuralError`] - a dataset lacks required columns
//! - [`WriteError`] - writing cleaned tables and the report
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Row-level problems are not errors: they are collected as
//! [`crate::schema::Rejection`]s and [`crate::dataset::CleaningAnomaly`]s.

use thiserror::Error;

use crate::models::EntityKind;

// =============================================================================
// Load Errors
// =============================================================================

/// Errors while reading a CSV input.
#[derive(Debug, Error)]
pub enum LoadError {
    /// Failed to read file.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Content could not be decoded.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Malformed CSV.
    #[error("Invalid CSV format at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading the pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read configuration {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration is not valid JSON or does not deserialize.
    #[error("Configuration JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The embedded configuration schema could not be compiled.
    #[error("Unreadable configuration schema: {0}")]
    SchemaDefinition(String),

    /// Configuration violates the schema.
    #[error("Configuration failed validation: {}", errors.join("; "))]
    SchemaViolation { errors: Vec<String> },

    /// A value passed the schema but is still unusable.
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Structural Errors
// =============================================================================

/// A dataset cannot be cleaned because required columns are absent.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{dataset} dataset is missing required column(s): {}", missing_columns.join(", "))]
pub struct StructuralError {
    /// Dataset that failed.
    pub dataset: EntityKind,
    /// Canonical names of the missing columns.
    pub missing_columns: Vec<String>,
}

// =============================================================================
// Write Errors
// =============================================================================

/// Errors while writing output artifacts.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to create or write a file.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV serialization failed.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed.
    #[error("JSON write error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::pipeline::run_pipeline`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input loading failed.
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// A dataset is structurally unusable.
    #[error("Structural error: {0}")]
    Structural(#[from] StructuralError),

    /// Output writing failed.
    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    /// A background task panicked or was cancelled.
    #[error("Task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::Task(err.to_string())
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for load operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Result type for write operations.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let load_err = LoadError::EmptyFile;
        let pipeline_err: PipelineError = load_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        let structural = StructuralError {
            dataset: EntityKind::Sale,
            missing_columns: vec!["employee_id".into(), "amount".into()],
        };
        let pipeline_err: PipelineError = structural.into();
        let msg = pipeline_err.to_string();
        assert!(msg.contains("sales"));
        assert!(msg.contains("employee_id, amount"));
    }

    #[test]
    fn test_schema_violation_format() {
        let err = ConfigError::SchemaViolation {
            errors: vec!["a is required".into(), "b must be integer".into()],
        };
        assert_eq!(
            err.to_string(),
            "Configuration failed validation: a is required; b must be integer"
        );
    }

    #[test]
    fn test_parse_error_names_line() {
        let err = LoadError::Parse {
            line: 7,
            message: "unequal lengths".into(),
        };
        assert!(err.to_string().contains("line 7"));
    }
}
