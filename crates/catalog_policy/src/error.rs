//! Error types for policy and ruleset loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for policy operations.
pub type Result<T> = std::result::Result<T, PolicyError>;

/// Errors that can occur while reading policies and rulesets.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// YAML parsing or deserialization failed
    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml_ng::Error),

    /// File I/O error
    #[error("Failed to read '{path}': {source}")]
    IoError {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// No document exists for the requested key
    #[error("Not found: {0}")]
    NotFound(String),

    /// The document parsed but failed the structural self-check
    #[error("Invalid policy structure: {}", .0.join("; "))]
    InvalidStructure(Vec<String>),
}

impl PolicyError {
    /// Creates a new I/O error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            source,
        }
    }
}
