//! Error types for rule construction.
//!
//! Rules never fail while validating; these errors describe configuration
//! that cannot be turned into rules.

use catalog_policy::PolicyError;
use thiserror::Error;

/// Result type alias for rule operations.
pub type Result<T> = std::result::Result<T, RuleError>;

/// Errors that can occur while building rules and engines.
#[derive(Debug, Error)]
pub enum RuleError {
    /// Invalid regex pattern
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// Pattern as written in the configuration
        pattern: String,
        /// Compilation error
        source: regex::Error,
    },

    /// Rule parameters are inconsistent
    #[error("Invalid configuration for rule '{rule}': {message}")]
    InvalidConfig {
        /// Rule identifier
        rule: String,
        /// Description of the problem
        message: String,
    },

    /// Ruleset or policy could not be read
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

impl RuleError {
    /// Creates a new invalid regex error.
    pub fn invalid_regex(pattern: impl Into<String>, source: regex::Error) -> Self {
        Self::InvalidRegex {
            pattern: pattern.into(),
            source,
        }
    }

    /// Creates a new invalid configuration error.
    pub fn invalid_config(rule: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            rule: rule.into(),
            message: message.into(),
        }
    }
}
