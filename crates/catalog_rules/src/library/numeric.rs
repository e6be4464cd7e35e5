//! Numeric rules.
//!
//! Every rule coerces first: a value that cannot be read as a number fails
//! with `NOT_NUMERIC` ("Value must be numeric"), distinct from the bound,
//! sign and integrality messages. Missing values pass.

use super::is_missing;
use crate::rule::{Fix, Rule};
use crate::{Result, RuleError};
use catalog_core::{CellValue, RuleViolation, ValidationContext};

/// Rewrites a decimal-comma number (`"10,50"`, `"1.234,56"`) with a dot.
///
/// Returns `None` when the text has no decimal comma or does not parse.
pub fn normalize_decimal_separator(text: &str) -> Option<String> {
    let text = text.trim();
    let normalized = match (text.rfind(','), text.rfind('.')) {
        (Some(comma), Some(dot)) if dot < comma => text.replace('.', "").replace(',', "."),
        (Some(_), None) if text.matches(',').count() == 1 => text.replace(',', "."),
        _ => return None,
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())?;
    Some(normalized)
}

/// Parses a finite number, accepting a decimal comma.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let normalized = normalize_decimal_separator(text).unwrap_or_else(|| text.trim().to_string());
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Digits after the decimal point in the shortest representation of `n`.
pub fn decimal_places_of(n: f64) -> usize {
    n.to_string()
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

enum Coerced {
    Missing,
    Invalid,
    Number(f64),
}

fn coerce(value: &CellValue) -> Coerced {
    if is_missing(value) {
        return Coerced::Missing;
    }
    match value.as_number() {
        Some(n) => Coerced::Number(n),
        None => Coerced::Invalid,
    }
}

fn not_numeric(ctx: &ValidationContext<'_>, value: &CellValue) -> RuleViolation {
    RuleViolation::new(ctx, "NOT_NUMERIC", "Value must be numeric", value)
        .with_suggestion("Use digits with a dot as decimal separator, e.g. 10.50")
}

fn decimal_separator_fix(value: &CellValue) -> Option<Fix> {
    let normalized = normalize_decimal_separator(value.as_str()?)?;
    Some(Fix::new(normalized, "decimal_separator", 0.95))
}

/// True when the coerced number is integral, so `"5.0"` counts as whole.
fn is_whole(n: f64) -> bool {
    n.fract() == 0.0
}

fn not_integer(ctx: &ValidationContext<'_>, value: &CellValue) -> RuleViolation {
    RuleViolation::new(ctx, "NOT_INTEGER", "Value must be a whole number", value)
        .with_suggestion("Remove the decimal part")
}

/// Proposes the integer spelling of a whole number written as text.
///
/// Normalizes `"5.0"` and `"5,0"` to `"5"`.
fn whole_number_fix(value: &CellValue) -> Option<(i64, Fix)> {
    let text = value.as_str()?;
    let n = parse_decimal(text)?;
    if n.fract() != 0.0 || n.abs() > i64::MAX as f64 {
        return None;
    }
    let whole = n as i64;
    let (correction_type, confidence) = if normalize_decimal_separator(text).is_some() {
        ("decimal_separator", 0.95)
    } else {
        ("integer_normalization", 0.9)
    };
    Some((whole, Fix::new(whole.to_string(), correction_type, confidence)))
}

/// Number within inclusive bounds, optionally with limited decimals.
#[derive(Debug, Clone)]
pub struct NumericRangeRule {
    min: f64,
    max: f64,
    decimal_places: Option<u32>,
}

impl NumericRangeRule {
    /// Creates the rule; fails when `min > max`.
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if min > max || min.is_nan() || max.is_nan() {
            return Err(RuleError::invalid_config(
                "numeric_range",
                format!("min ({}) must not exceed max ({})", min, max),
            ));
        }
        Ok(Self {
            min,
            max,
            decimal_places: None,
        })
    }

    /// Limits the number of digits after the decimal point.
    pub fn with_decimal_places(mut self, places: u32) -> Self {
        self.decimal_places = Some(places);
        self
    }

    fn range_hint(&self) -> String {
        format!("Use a value between {} and {}", self.min, self.max)
    }
}

impl Rule for NumericRangeRule {
    fn id(&self) -> &str {
        "numeric_range"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let n = match coerce(value) {
            Coerced::Missing => return None,
            Coerced::Invalid => return Some(not_numeric(ctx, value)),
            Coerced::Number(n) => n,
        };

        if n < self.min {
            return Some(
                RuleViolation::new(
                    ctx,
                    "BELOW_MINIMUM",
                    format!("Value must be at least {}", self.min),
                    value,
                )
                .with_suggestion(self.range_hint()),
            );
        }
        if n > self.max {
            return Some(
                RuleViolation::new(
                    ctx,
                    "ABOVE_MAXIMUM",
                    format!("Value must be at most {}", self.max),
                    value,
                )
                .with_suggestion(self.range_hint()),
            );
        }
        if let Some(places) = self.decimal_places {
            if decimal_places_of(n) > places as usize {
                return Some(
                    RuleViolation::new(
                        ctx,
                        "DECIMAL_PLACES",
                        format!("Value must have at most {} decimal places", places),
                        value,
                    )
                    .with_suggestion(format!("Round to {} decimal places", places)),
                );
            }
        }
        None
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        match coerce(value) {
            Coerced::Invalid => decimal_separator_fix(value),
            Coerced::Number(n) => {
                let places = self.decimal_places? as usize;
                if decimal_places_of(n) <= places {
                    return None;
                }
                Some(Fix::new(format!("{:.*}", places, n), "decimal_rounding", 0.85))
            }
            Coerced::Missing => None,
        }
    }
}

/// Number strictly greater than zero.
#[derive(Debug, Clone, Default)]
pub struct PositiveNumberRule;

impl PositiveNumberRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for PositiveNumberRule {
    fn id(&self) -> &str {
        "positive_number"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        match coerce(value) {
            Coerced::Missing => None,
            Coerced::Invalid => Some(not_numeric(ctx, value)),
            Coerced::Number(n) if n <= 0.0 => Some(
                RuleViolation::new(ctx, "NOT_POSITIVE", "Value must be greater than zero", value)
                    .with_suggestion("Use a positive number"),
            ),
            Coerced::Number(_) => None,
        }
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        decimal_separator_fix(value)
    }
}

/// Whole number.
#[derive(Debug, Clone, Default)]
pub struct IntegerRule;

impl IntegerRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for IntegerRule {
    fn id(&self) -> &str {
        "integer"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        match coerce(value) {
            Coerced::Missing => None,
            Coerced::Invalid => Some(not_numeric(ctx, value)),
            Coerced::Number(n) if !is_whole(n) => Some(not_integer(ctx, value)),
            Coerced::Number(_) => None,
        }
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        whole_number_fix(value).map(|(_, fix)| fix)
    }
}

/// Non-negative whole number.
#[derive(Debug, Clone, Default)]
pub struct StockQuantityRule;

impl StockQuantityRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for StockQuantityRule {
    fn id(&self) -> &str {
        "stock_quantity"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let n = match coerce(value) {
            Coerced::Missing => return None,
            Coerced::Invalid => return Some(not_numeric(ctx, value)),
            Coerced::Number(n) => n,
        };
        if !is_whole(n) {
            return Some(not_integer(ctx, value));
        }
        if n < 0.0 {
            return Some(
                RuleViolation::new(
                    ctx,
                    "NEGATIVE_STOCK",
                    "Stock quantity cannot be negative",
                    value,
                )
                .with_suggestion("Use 0 or a positive whole number"),
            );
        }
        None
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        let floor = match value {
            CellValue::Int(_) | CellValue::Float(_) => CellValue::Int(0),
            _ => CellValue::from("0"),
        };

        match value {
            CellValue::Int(i) if *i < 0 => Some(Fix::new(floor, "stock_floor", 0.6)),
            CellValue::Float(f) if *f < 0.0 && f.fract() == 0.0 => {
                Some(Fix::new(floor, "stock_floor", 0.6))
            }
            CellValue::String(_) => {
                let (whole, fix) = whole_number_fix(value)?;
                if whole < 0 {
                    Some(Fix::new(floor, "stock_floor", 0.6))
                } else {
                    Some(fix)
                }
            }
            _ => None,
        }
    }
}
