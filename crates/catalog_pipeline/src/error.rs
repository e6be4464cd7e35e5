//! Error types for the validation pipeline.

use catalog_policy::PolicyError;
use catalog_rules::RuleError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Configuration errors surfaced by the pipeline.
///
/// Data problems never show up here; they are reported as items of the
/// validation result.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No provider or validator is registered for the marketplace
    #[error("No rule provider registered for marketplace '{0}'")]
    UnregisteredMarketplace(String),

    /// Invalid pipeline configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be read
    #[error("Failed to read '{path}': {source}")]
    Io {
        /// File being read
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// YAML configuration error
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// TOML configuration error
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Rules could not be built
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// Policy or ruleset could not be loaded
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl PipelineError {
    /// Creates an I/O error for `path`.
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}
