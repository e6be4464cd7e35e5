//! Validation result types handed to API and worker layers.
//!
//! Everything here is serializable so outer layers can persist or render a
//! [`ValidationResult`] without knowing how it was produced.

use crate::{CellValue, RuleViolation, Severity, Table};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Error code used when a row could not be evaluated at all.
pub const VALIDATION_ERROR_CODE: &str = "VALIDATION_ERROR";

/// Error code used when the input itself is unusable.
pub const MALFORMED_INPUT_CODE: &str = "MALFORMED_INPUT";

/// Worst-case status of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidationStatus {
    /// No errors or warnings
    Pass,
    /// Only informational findings
    Info,
    /// At least one warning, no errors
    Warning,
    /// At least one blocking error
    Error,
}

impl ValidationStatus {
    /// Derives the status from the most severe finding.
    pub fn from_errors(errors: &[ErrorDetail]) -> Self {
        match errors.iter().map(|e| e.severity).max() {
            None => ValidationStatus::Pass,
            Some(Severity::Info) => ValidationStatus::Info,
            Some(Severity::Warning) => ValidationStatus::Warning,
            Some(Severity::Error | Severity::Critical) => ValidationStatus::Error,
        }
    }
}

/// API-level description of one finding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Column the finding refers to
    pub field: String,
    /// Machine-readable error code
    pub code: String,
    /// Human-readable explanation
    pub message: String,
    /// Offending value as displayed in the input
    pub value: Option<String>,
    /// Concrete suggestion for the user
    pub suggestion: Option<String>,
    /// Severity of the finding
    pub severity: Severity,
}

impl ErrorDetail {
    /// Creates a finding with the given severity and no value or suggestion.
    pub fn new(
        field: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
            value: None,
            suggestion: None,
            severity,
        }
    }

    /// Attaches the offending value.
    pub fn with_value(mut self, value: &CellValue) -> Self {
        self.value = (!value.is_null()).then(|| value.to_display());
        self
    }

    /// Attaches a suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Returns true if this finding invalidates its row.
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

impl From<RuleViolation> for ErrorDetail {
    fn from(v: RuleViolation) -> Self {
        Self {
            value: (!v.value.is_null()).then(|| v.value.to_display()),
            field: v.column,
            code: v.code,
            message: v.message,
            suggestion: v.suggestion,
            severity: v.severity,
        }
    }
}

/// One applied fix, with its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionDetail {
    /// Column that was corrected
    pub field: String,
    /// Value before the fix
    pub original_value: CellValue,
    /// Value after the fix
    pub corrected_value: CellValue,
    /// Strategy that produced the fix (e.g. "truncate")
    pub correction_type: String,
    /// Confidence in the fix, 0.0 to 1.0
    pub confidence: f64,
}

impl CorrectionDetail {
    /// Creates a correction with confidence 1.0.
    ///
    /// Returns `None` when the corrected value equals the original, since a
    /// no-op fix is never recorded.
    pub fn new(
        field: impl Into<String>,
        original_value: CellValue,
        corrected_value: CellValue,
        correction_type: impl Into<String>,
    ) -> Option<Self> {
        if original_value == corrected_value {
            return None;
        }
        Some(Self {
            field: field.into(),
            original_value,
            corrected_value,
            correction_type: correction_type.into(),
            confidence: 1.0,
        })
    }

    /// Sets the confidence, clamped to `0.0..=1.0`.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// Every finding and correction for one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationItem {
    /// 1-based row number; 0 for findings about the input as a whole
    pub row_number: usize,
    /// Worst-case status across `errors`
    pub status: ValidationStatus,
    /// Findings, in rule order
    pub errors: Vec<ErrorDetail>,
    /// Applied fixes
    pub corrections: Vec<CorrectionDetail>,
    /// Optional extra information
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<BTreeMap<String, serde_json::Value>>,
}

impl ValidationItem {
    /// Creates an item, deriving its status from `errors`.
    pub fn new(
        row_number: usize,
        errors: Vec<ErrorDetail>,
        corrections: Vec<CorrectionDetail>,
    ) -> Self {
        Self {
            row_number,
            status: ValidationStatus::from_errors(&errors),
            errors,
            corrections,
            metadata: None,
        }
    }

    /// Creates the item reported for a row whose evaluation failed unexpectedly.
    pub fn row_failure(row_number: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        let detail = ErrorDetail::new(
            "_row",
            VALIDATION_ERROR_CODE,
            format!("Row could not be validated: {}", message),
            Severity::Error,
        )
        .with_suggestion("Check the row for malformed values and try again");
        Self::new(row_number, vec![detail], Vec::new())
    }

    /// Creates the single item reported for unusable input.
    pub fn malformed_input(message: impl Into<String>) -> Self {
        let detail = ErrorDetail::new("_input", MALFORMED_INPUT_CODE, message, Severity::Error)
            .with_suggestion("Upload a file with a header row and at least one data row");
        Self::new(0, vec![detail], Vec::new())
    }

    /// Attaches a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value);
        self
    }

    /// Returns true if any finding invalidates the row.
    pub fn has_blocking_error(&self) -> bool {
        self.errors.iter().any(ErrorDetail::is_blocking)
    }

    /// Number of blocking findings.
    pub fn error_count(&self) -> usize {
        self.errors.iter().filter(|e| e.is_blocking()).count()
    }

    /// Number of warnings.
    pub fn warning_count(&self) -> usize {
        self.errors
            .iter()
            .filter(|e| e.severity == Severity::Warning)
            .count()
    }
}

/// Dataset-level rollup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Number of data rows in the input
    pub total_rows: usize,
    /// Rows without any blocking finding
    pub valid_rows: usize,
    /// Rows with at least one blocking finding
    pub invalid_rows: usize,
    /// Blocking findings across all items
    pub total_errors: usize,
    /// Warnings across all items
    pub total_warnings: usize,
    /// Applied corrections across all items
    pub total_corrections: usize,
    /// Finding count per error code
    pub error_types: BTreeMap<String, usize>,
    /// Wall-clock processing time
    pub processing_time_seconds: f64,
}

impl ValidationSummary {
    /// Aggregates item-level counts.
    ///
    /// Warnings never invalidate a row; `valid_rows + invalid_rows` always
    /// equals `total_rows`. Input-level items (row 0) contribute to the
    /// finding counts but not to the row partition.
    pub fn from_items(total_rows: usize, items: &[ValidationItem], elapsed: Duration) -> Self {
        let mut summary = Self {
            total_rows,
            processing_time_seconds: elapsed.as_secs_f64(),
            ..Default::default()
        };

        for item in items {
            if item.row_number > 0 && item.has_blocking_error() {
                summary.invalid_rows += 1;
            }
            summary.total_errors += item.error_count();
            summary.total_warnings += item.warning_count();
            summary.total_corrections += item.corrections.len();
            for error in &item.errors {
                *summary.error_types.entry(error.code.clone()).or_default() += 1;
            }
        }

        summary.invalid_rows = summary.invalid_rows.min(total_rows);
        summary.valid_rows = total_rows - summary.invalid_rows;
        summary
    }
}

/// Top-level output of one validation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Per-row items in row order
    pub items: Vec<ValidationItem>,
    /// Dataset rollup
    pub summary: ValidationSummary,
    /// Corrected copy of the input, when auto-fix ran
    pub corrected_data: Option<Table>,
    /// Marketplace the data was validated for
    pub marketplace: String,
    /// Category the data was validated for
    pub category: String,
    /// Whether auto-fix was applied
    pub auto_fix_applied: bool,
    /// Correlation id supplied by the caller
    pub job_id: Option<String>,
    /// When the validation finished
    pub validated_at: DateTime<Utc>,
}

impl ValidationResult {
    /// Returns true if no row has a blocking finding.
    pub fn is_valid(&self) -> bool {
        self.summary.total_errors == 0
    }

    /// Returns the item for a 1-based row number.
    pub fn item(&self, row_number: usize) -> Option<&ValidationItem> {
        self.items.iter().find(|i| i.row_number == row_number)
    }

    /// Iterates over every finding with its row number.
    pub fn findings(&self) -> impl Iterator<Item = (usize, &ErrorDetail)> {
        self.items
            .iter()
            .flat_map(|item| item.errors.iter().map(move |e| (item.row_number, e)))
    }
}
