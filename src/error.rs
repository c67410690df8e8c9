//! Error types for Pulse Series
//!
//! The resampling core never fails; these errors only surface at the ingestion
//! and configuration boundary.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading input or configuration
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Expected a JSON array of records, found {0}")]
    NotAnArray(&'static str),

    #[error("Unsupported time range: {0} days (expected 1, 3, 7, 10 or 30)")]
    UnsupportedRange(u32),

    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    #[error("Invalid time range '{0}' (expected a day count such as 7 or 7d)")]
    InvalidRange(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("Invalid configuration: {}", format_validation(.0))]
    ConfigValidation(Vec<ValidationError>),
}

/// A single configuration field error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn format_validation(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
