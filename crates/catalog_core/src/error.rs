//! Per-row failures.
//!
//! Validation findings are never errors: they are reported as
//! [`ValidationItem`](crate::ValidationItem)s. [`RowError`] describes a row
//! that could not be evaluated at all.

use thiserror::Error;

/// A row whose evaluation failed unexpectedly.
///
/// The pipeline turns it into a single `VALIDATION_ERROR` item and carries on
/// with the remaining rows.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Row {row_number} could not be validated: {message}")]
pub struct RowError {
    /// 1-based row number
    pub row_number: usize,
    /// Failure description
    pub message: String,
}

impl RowError {
    /// Creates a new row error.
    pub fn new(row_number: usize, message: impl Into<String>) -> Self {
        Self {
            row_number,
            message: message.into(),
        }
    }
}
