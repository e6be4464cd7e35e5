//! The rule capability.

use catalog_core::{CellValue, RuleViolation, Severity, ValidationContext};
use std::fmt;
use std::sync::Arc;

/// A single-cell check, optionally able to correct the value it rejects.
///
/// Rules are configured at construction and never mutated afterwards, so one
/// instance can be shared by every row and column of a run.
///
/// # Example
///
/// ```rust
/// use catalog_core::{row_of, CellValue, ValidationScope};
/// use catalog_rules::{MaxLengthRule, Rule};
///
/// let rule = MaxLengthRule::new(5);
/// let scope = ValidationScope::new("shopee", "toys");
/// let row = row_of([("name", "Toy Robot")]);
/// let ctx = scope.cell(1, "name", &row);
///
/// let violation = rule.validate(&row["name"], &ctx).unwrap();
/// assert_eq!(violation.suggestion.as_deref(), Some("Truncate to 5 characters"));
///
/// let fix = rule.fix(&row["name"], &ctx).unwrap();
/// assert_eq!(fix.value, CellValue::from("Toy R"));
/// ```
pub trait Rule: Send + Sync + fmt::Debug {
    /// Stable identifier, recorded on every violation the rule produces.
    fn id(&self) -> &str;

    /// Checks `value`; returns `None` when it passes.
    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation>;

    /// Returns false to skip the rule for this context.
    fn can_apply(&self, _ctx: &ValidationContext<'_>) -> bool {
        true
    }

    /// Proposes a corrected value for a rejected `value`.
    fn fix(&self, _value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        None
    }
}

/// Shared handle to a rule.
pub type SharedRule = Arc<dyn Rule>;

/// A proposed correction.
#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    /// Corrected value
    pub value: CellValue,
    /// Strategy tag (e.g. "truncate")
    pub correction_type: String,
    /// Confidence in the correction, 0.0 to 1.0
    pub confidence: f64,
}

impl Fix {
    /// Creates a fix.
    pub fn new(
        value: impl Into<CellValue>,
        correction_type: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            value: value.into(),
            correction_type: correction_type.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Runs a rule and stamps its id on the violation.
pub(crate) fn evaluate(
    rule: &dyn Rule,
    value: &CellValue,
    ctx: &ValidationContext<'_>,
) -> Option<RuleViolation> {
    let mut violation = rule.validate(value, ctx)?;
    if violation.rule_id.is_none() {
        violation.rule_id = Some(rule.id().to_string());
    }
    Some(violation)
}

/// Restricts a rule to a set of categories.
#[derive(Debug, Clone)]
pub struct CategoryScopedRule {
    inner: SharedRule,
    categories: Vec<String>,
}

impl CategoryScopedRule {
    /// Wraps `inner` so it only applies to the listed categories.
    pub fn new<I, S>(inner: SharedRule, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            inner,
            categories: categories
                .into_iter()
                .map(|c| c.as_ref().trim().to_lowercase())
                .collect(),
        }
    }

    /// Categories the rule applies to.
    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

impl Rule for CategoryScopedRule {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        self.inner.validate(value, ctx)
    }

    fn can_apply(&self, ctx: &ValidationContext<'_>) -> bool {
        let category = ctx.category().trim().to_lowercase();
        self.categories.contains(&category) && self.inner.can_apply(ctx)
    }

    fn fix(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<Fix> {
        self.inner.fix(value, ctx)
    }
}

/// A rule whose severity and message are overridden by configuration.
#[derive(Debug, Clone)]
pub struct ConfiguredRule {
    inner: SharedRule,
    severity: Option<Severity>,
    message: Option<String>,
}

impl ConfiguredRule {
    /// Wraps `inner` with optional overrides.
    pub fn new(inner: SharedRule, severity: Option<Severity>, message: Option<String>) -> Self {
        Self {
            inner,
            severity,
            message,
        }
    }
}

impl Rule for ConfiguredRule {
    fn id(&self) -> &str {
        self.inner.id()
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let mut violation = self.inner.validate(value, ctx)?;
        if let Some(severity) = self.severity {
            violation.severity = severity;
        }
        if let Some(message) = &self.message {
            violation.message = message.clone();
        }
        Some(violation)
    }

    fn can_apply(&self, ctx: &ValidationContext<'_>) -> bool {
        self.inner.can_apply(ctx)
    }

    fn fix(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<Fix> {
        self.inner.fix(value, ctx)
    }
}
