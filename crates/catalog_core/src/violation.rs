//! Rule-level findings.

use crate::{CellValue, ValidationContext};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordinal importance of a finding: `Info < Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational, never affects validity
    #[serde(alias = "info")]
    Info,
    /// Non-blocking issue
    #[serde(alias = "warning")]
    Warning,
    /// Blocking issue, invalidates the row
    #[serde(alias = "error")]
    Error,
    /// Blocking issue that also needs operator attention
    #[serde(alias = "critical")]
    Critical,
}

impl Severity {
    /// Returns true if this severity invalidates a row.
    pub fn is_blocking(self) -> bool {
        self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// One failed check, as produced by a rule for a single cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleViolation {
    /// 1-based row number
    pub row: usize,
    /// Column the rule was evaluated on
    pub column: String,
    /// Machine-readable error code (e.g. "MAX_LENGTH")
    pub code: String,
    /// Human-readable explanation
    pub message: String,
    /// Offending value
    pub value: CellValue,
    /// Concrete suggestion for the user, if any
    pub suggestion: Option<String>,
    /// Severity of the finding
    pub severity: Severity,
    /// Identifier of the rule that produced it
    pub rule_id: Option<String>,
}

impl RuleViolation {
    /// Creates an ERROR-severity violation located at `ctx`.
    pub fn new(
        ctx: &ValidationContext<'_>,
        code: impl Into<String>,
        message: impl Into<String>,
        value: &CellValue,
    ) -> Self {
        Self {
            row: ctx.row_number,
            column: ctx.column_name.to_string(),
            code: code.into(),
            message: message.into(),
            value: value.clone(),
            suggestion: None,
            severity: Severity::Error,
            rule_id: None,
        }
    }

    /// Sets the severity.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the suggestion.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Sets the producing rule id.
    pub fn with_rule_id(mut self, rule_id: impl Into<String>) -> Self {
        self.rule_id = Some(rule_id.into());
        self
    }

    /// Returns true if this violation invalidates its row.
    pub fn is_blocking(&self) -> bool {
        self.severity.is_blocking()
    }
}

impl fmt::Display for RuleViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] row {} column '{}': {}",
            self.severity, self.row, self.column, self.message
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}
