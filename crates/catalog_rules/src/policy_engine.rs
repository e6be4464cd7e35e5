//! Declarative policy interpretation.
//!
//! [`PolicyRuleEngine`] validates a row directly against a [`Policy`],
//! without compiling rule objects. Codes are derived from the field name:
//! `TITLE_TOO_LONG`, `PRICE_NOT_NUMERIC`, `VOLTAGE_INVALID_VALUE`, ...
//!
//! Corrections only capture transforms (`trim`, `uppercase`, `lowercase`);
//! invalid values are reported, never repaired.

use crate::library::{decimal_places_of, is_missing, parse_decimal};
use crate::{Result, RuleError};
use catalog_core::{CellValue, CorrectionDetail, ErrorDetail, Row, Severity};
use catalog_policy::{AttributeType, CustomAttribute, FieldRule, Policy};
use regex::Regex;
use std::collections::HashMap;
use std::sync::Arc;

/// Boolean tokens accepted by boolean custom attributes.
pub const BOOLEAN_TOKENS: &[&str] = &["true", "false", "1", "0", "yes", "no", "sim", "não", "nao"];

/// Result of validating one row against a policy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyOutcome {
    /// True when no ERROR or CRITICAL finding is present
    pub is_valid: bool,
    /// Errors and warnings, in policy order
    pub errors: Vec<ErrorDetail>,
    /// Transform-driven corrections
    pub corrections: Vec<CorrectionDetail>,
}

/// Validates rows against one policy.
///
/// # Example
///
/// ```rust
/// use catalog_core::row_of;
/// use catalog_policy::parse_policy_yaml;
/// use catalog_rules::PolicyRuleEngine;
/// use std::sync::Arc;
///
/// let policy = parse_policy_yaml(r#"
/// marketplace: mercadolivre
/// category: electronics
/// fields:
///   price:
///     min_value: 0
///     decimal_places: 2
/// warnings:
///   min_images: 0
///   require_description: false
/// "#).unwrap();
///
/// let engine = PolicyRuleEngine::new(Arc::new(policy)).unwrap();
/// let outcome = engine.validate_row(&row_of([("price", "10,50")]));
///
/// assert!(outcome.is_valid);
/// assert!(outcome.corrections.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct PolicyRuleEngine {
    policy: Arc<Policy>,
    patterns: HashMap<String, Regex>,
}

impl PolicyRuleEngine {
    /// Prepares `policy`, compiling every pattern it declares.
    pub fn new(policy: Arc<Policy>) -> Result<Self> {
        let mut patterns = HashMap::new();
        let declared = policy
            .fields
            .iter()
            .filter_map(|(name, rule)| Some((name, rule.pattern.as_ref()?)))
            .chain(
                policy
                    .custom_attributes
                    .iter()
                    .filter_map(|(name, attr)| Some((name, attr.pattern.as_ref()?))),
            );
        for (name, pattern) in declared {
            let regex = Regex::new(pattern).map_err(|e| RuleError::invalid_regex(pattern, e))?;
            patterns.insert(name.clone(), regex);
        }
        Ok(Self { policy, patterns })
    }

    /// The policy being applied.
    pub fn policy(&self) -> &Arc<Policy> {
        &self.policy
    }

    /// Validates one row.
    pub fn validate_row(&self, row: &Row) -> PolicyOutcome {
        let mut outcome = PolicyOutcome::default();

        for (name, rule) in &self.policy.fields {
            let value = row.get(name).cloned().unwrap_or_default();
            self.check_field(name, rule, &value, &mut outcome);
        }
        for (name, attr) in &self.policy.custom_attributes {
            let value = row.get(name).cloned().unwrap_or_default();
            self.check_attribute(name, attr, &value, &mut outcome);
        }
        self.check_warnings(row, &mut outcome);

        outcome.is_valid = !outcome.errors.iter().any(ErrorDetail::is_blocking);
        outcome
    }

    /// Applies the outcome's corrections to a copy of `row`.
    pub fn apply_corrections(row: &Row, outcome: &PolicyOutcome) -> Row {
        let mut corrected = row.clone();
        for correction in &outcome.corrections {
            corrected.insert(correction.field.clone(), correction.corrected_value.clone());
        }
        corrected
    }

    fn error(
        &self,
        field: &str,
        suffix: &str,
        default_message: String,
        value: &CellValue,
    ) -> ErrorDetail {
        let code = format!("{}_{}", field.to_uppercase(), suffix);
        let message = self
            .policy
            .message_for(&code)
            .map(str::to_string)
            .unwrap_or(default_message);
        ErrorDetail::new(field, code, message, Severity::Error).with_value(value)
    }

    fn check_field(
        &self,
        name: &str,
        rule: &FieldRule,
        value: &CellValue,
        out: &mut PolicyOutcome,
    ) {
        if is_missing(value) {
            if rule.required {
                out.errors.push(
                    self.error(name, "REQUIRED", format!("Field '{}' is required", name), value)
                        .with_suggestion(format!("Provide a value for '{}'", name)),
                );
            }
            return;
        }

        if rule.is_numeric(name) {
            self.check_numeric(name, rule, value, out);
        } else {
            self.check_text(name, rule, value, out);
        }
    }

    fn check_text(&self, name: &str, rule: &FieldRule, value: &CellValue, out: &mut PolicyOutcome) {
        let mut text = value.to_display();

        if let Some(transform) = rule.transform {
            let transformed = transform.apply(&text);
            if transformed != text {
                if let Some(correction) = CorrectionDetail::new(
                    name,
                    value.clone(),
                    CellValue::String(transformed.clone()),
                    transform.name(),
                ) {
                    out.corrections.push(correction);
                }
                text = transformed;
            }
        }

        let len = text.chars().count();
        if let Some(min) = rule.min_length {
            if len < min {
                out.errors.push(
                    self.error(
                        name,
                        "TOO_SHORT",
                        format!(
                            "Field '{}' must be at least {} characters ({} given)",
                            name, min, len
                        ),
                        value,
                    )
                    .with_suggestion(format!("Expand to at least {} characters", min)),
                );
            }
        }
        if let Some(max) = rule.max_length {
            if len > max {
                out.errors.push(
                    self.error(
                        name,
                        "TOO_LONG",
                        format!(
                            "Field '{}' must be at most {} characters ({} given)",
                            name, max, len
                        ),
                        value,
                    )
                    .with_suggestion(format!("Truncate to {} characters", max)),
                );
            }
        }

        if let Some(forbidden) = rule.forbidden_chars.iter().find(|c| text.contains(c.as_str())) {
            out.errors.push(
                self.error(
                    name,
                    "FORBIDDEN_CHAR",
                    format!("Field '{}' contains forbidden character '{}'", name, forbidden),
                    value,
                )
                .with_suggestion(format!("Remove '{}'", forbidden)),
            );
        }

        if let Some(regex) = self.patterns.get(name) {
            if !regex.is_match(&text) {
                out.errors.push(self.error(
                    name,
                    "INVALID_FORMAT",
                    format!("Field '{}' has an invalid format", name),
                    value,
                ));
            }
        }

        if !rule.enum_values.is_empty()
            && !matches_enum(&text, &rule.enum_values, rule.case_insensitive)
        {
            out.errors.push(
                self.error(
                    name,
                    "INVALID_VALUE",
                    format!("Field '{}' must be one of: {}", name, rule.enum_values.join(", ")),
                    value,
                )
                .with_suggestion(format!("Use one of: {}", rule.enum_values.join(", "))),
            );
        }
    }

    fn check_numeric(
        &self,
        name: &str,
        rule: &FieldRule,
        value: &CellValue,
        out: &mut PolicyOutcome,
    ) {
        let number = match value {
            CellValue::Int(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::String(s) => parse_decimal(s),
            _ => None,
        };
        let Some(n) = number else {
            out.errors.push(
                self.error(name, "NOT_NUMERIC", format!("Field '{}' must be numeric", name), value)
                    .with_suggestion("Use digits, e.g. 10.50 or 10,50"),
            );
            return;
        };

        if let Some(min) = rule.min_value {
            if n < min {
                out.errors.push(self.error(
                    name,
                    "BELOW_MIN",
                    format!("Field '{}' must be at least {}", name, min),
                    value,
                ));
            }
        }
        if let Some(max) = rule.max_value {
            if n > max {
                out.errors.push(self.error(
                    name,
                    "ABOVE_MAX",
                    format!("Field '{}' must be at most {}", name, max),
                    value,
                ));
            }
        }
        if let Some(places) = rule.decimal_places {
            if decimal_places_of(n) > places as usize {
                out.errors.push(
                    self.error(
                        name,
                        "DECIMAL_PLACES",
                        format!("Field '{}' must have at most {} decimal places", name, places),
                        value,
                    )
                    .with_suggestion(format!("Round to {} decimal places", places)),
                );
            }
        }
        if rule.is_integer(name) && n.fract() != 0.0 {
            out.errors.push(self.error(
                name,
                "NOT_INTEGER",
                format!("Field '{}' must be a whole number", name),
                value,
            ));
        }
    }

    fn check_attribute(
        &self,
        name: &str,
        attr: &CustomAttribute,
        value: &CellValue,
        out: &mut PolicyOutcome,
    ) {
        if is_missing(value) {
            if attr.required {
                out.errors.push(self.error(
                    name,
                    "REQUIRED",
                    format!("Attribute '{}' is required", name),
                    value,
                ));
            }
            return;
        }

        let text = value.to_display().trim().to_string();
        match attr.attr_type {
            AttributeType::Enum => {
                if !matches_enum(&text, &attr.values, attr.case_insensitive) {
                    out.errors.push(
                        self.error(
                            name,
                            "INVALID_VALUE",
                            format!(
                                "Attribute '{}' must be one of: {}",
                                name,
                                attr.values.join(", ")
                            ),
                            value,
                        )
                        .with_suggestion(format!("Use one of: {}", attr.values.join(", "))),
                    );
                }
            }
            AttributeType::String => {
                if let Some(max) = attr.max_length {
                    if text.chars().count() > max {
                        out.errors.push(
                            self.error(
                                name,
                                "TOO_LONG",
                                format!("Attribute '{}' must be at most {} characters", name, max),
                                value,
                            )
                            .with_suggestion(format!("Truncate to {} characters", max)),
                        );
                    }
                }
                if let Some(regex) = self.patterns.get(name) {
                    if !regex.is_match(&text) {
                        out.errors.push(self.error(
                            name,
                            "INVALID_FORMAT",
                            format!("Attribute '{}' has an invalid format", name),
                            value,
                        ));
                    }
                }
            }
            AttributeType::Boolean => {
                let valid = match value {
                    CellValue::Bool(_) => true,
                    CellValue::Int(i) => *i == 0 || *i == 1,
                    _ => BOOLEAN_TOKENS.contains(&text.to_lowercase().as_str()),
                };
                if !valid {
                    out.errors.push(
                        self.error(
                            name,
                            "INVALID_VALUE",
                            format!("Attribute '{}' must be a boolean", name),
                            value,
                        )
                        .with_suggestion("Use true/false, yes/no, sim/não or 1/0"),
                    );
                }
            }
        }
    }

    fn check_warnings(&self, row: &Row, out: &mut PolicyOutcome) {
        let warnings = &self.policy.warnings;

        if warnings.require_description && row.get("description").is_none_or(is_missing) {
            out.errors.push(
                ErrorDetail::new(
                    "description",
                    "DESCRIPTION_MISSING",
                    self.policy
                        .message_for("DESCRIPTION_MISSING")
                        .unwrap_or("Listing has no description"),
                    Severity::Warning,
                )
                .with_suggestion("Add a description to improve conversion"),
            );
        }

        if warnings.min_images > 0 {
            let count = count_images(row);
            if count < warnings.min_images {
                let default_message = format!(
                    "Listing has {} images; at least {} are recommended",
                    count, warnings.min_images
                );
                out.errors.push(
                    ErrorDetail::new(
                        "images",
                        "INSUFFICIENT_IMAGES",
                        self.policy
                            .message_for("INSUFFICIENT_IMAGES")
                            .map(str::to_string)
                            .unwrap_or(default_message),
                        Severity::Warning,
                    )
                    .with_suggestion(format!("Add at least {} images", warnings.min_images)),
                );
            }
        }
    }
}

fn matches_enum(text: &str, allowed: &[String], case_insensitive: bool) -> bool {
    if case_insensitive {
        let text = text.to_lowercase();
        allowed.iter().any(|a| a.to_lowercase() == text)
    } else {
        allowed.iter().any(|a| a == text)
    }
}

/// Counts image URLs across `images`, `image`, `image_*` and `picture_*` columns.
///
/// The `images` column may hold several URLs separated by `,`, `;` or `|`.
pub fn count_images(row: &Row) -> usize {
    row.iter()
        .filter(|(column, _)| {
            let column = column.to_lowercase();
            column == "images"
                || column == "image"
                || column.starts_with("image_")
                || column.starts_with("picture_")
        })
        .map(|(_, value)| {
            if is_missing(value) {
                return 0;
            }
            value
                .to_display()
                .split([',', ';', '|'])
                .filter(|part| !part.trim().is_empty())
                .count()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::row_of;
    use catalog_policy::parse_policy_yaml;
    use pretty_assertions::assert_eq;

    const POLICY: &str = r#"
marketplace: mercadolivre
category: electronics
fields:
  title:
    required: true
    min_length: 5
    max_length: 20
    transform: trim
    forbidden_chars: ["<", ">"]
  price:
    required: true
    min_value: 0.01
    max_value: 10000
    decimal_places: 2
  stock:
    required: true
    min_value: 0
  sku:
    pattern: "^[A-Z0-9-]+$"
  condition:
    enum_values: [new, used]
    case_insensitive: true
custom_attributes:
  voltage:
    type: enum
    values: ["110V", "220V", "bivolt"]
  is_kit:
    type: boolean
  model:
    type: string
    max_length: 5
error_codes:
  TITLE_TOO_LONG: "Título muito longo"
"#;

    fn engine() -> PolicyRuleEngine {
        PolicyRuleEngine::new(Arc::new(parse_policy_yaml(POLICY).unwrap())).unwrap()
    }

    fn complete_row() -> Row {
        row_of([
            ("title", "Smart TV 50 4K"),
            ("price", "2999.90"),
            ("stock", "3"),
            ("sku", "TV-50"),
            ("condition", "NEW"),
            ("voltage", "bivolt"),
            ("is_kit", "não"),
            ("model", "X50"),
            ("description", "Great TV"),
            ("images", "https://a/1.jpg, https://a/2.jpg"),
            ("image_3", "https://a/3.jpg"),
        ])
    }

    fn codes(outcome: &PolicyOutcome) -> Vec<&str> {
        outcome.errors.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn test_complete_row_passes() {
        let outcome = engine().validate_row(&complete_row());
        assert!(outcome.is_valid, "{:?}", outcome.errors);
        assert!(outcome.errors.is_empty());
        assert!(outcome.corrections.is_empty());
    }

    #[test]
    fn test_required_short_circuits() {
        let mut row = complete_row();
        row.insert("title".into(), CellValue::Null);

        let outcome = engine().validate_row(&row);
        assert!(!outcome.is_valid);
        assert_eq!(codes(&outcome), vec!["TITLE_REQUIRED"]);
    }

    #[test]
    fn test_trim_recorded_as_correction() {
        let mut row = complete_row();
        row.insert("title".into(), "  Smart TV 50 4K  ".into());

        let outcome = engine().validate_row(&row);
        assert!(outcome.is_valid);
        assert_eq!(outcome.corrections.len(), 1);
        assert_eq!(outcome.corrections[0].correction_type, "trim");
        assert_eq!(
            outcome.corrections[0].corrected_value,
            CellValue::from("Smart TV 50 4K")
        );

        let corrected = PolicyRuleEngine::apply_corrections(&row, &outcome);
        assert_eq!(corrected["title"], CellValue::from("Smart TV 50 4K"));
    }

    #[test]
    fn test_string_checks_and_custom_messages() {
        let mut row = complete_row();
        row.insert("title".into(), "<b>An overly long title</b>".into());
        row.insert("sku".into(), "tv 50".into());
        row.insert("condition".into(), "refurbished".into());

        let outcome = engine().validate_row(&row);
        assert_eq!(
            codes(&outcome),
            vec![
                "CONDITION_INVALID_VALUE",
                "SKU_INVALID_FORMAT",
                "TITLE_TOO_LONG",
                "TITLE_FORBIDDEN_CHAR",
            ]
        );
        assert_eq!(outcome.errors[2].message, "Título muito longo");
        assert!(outcome.errors[3].message.contains("'<'"));
    }

    #[test]
    fn test_decimal_comma_price_passes_without_correction() {
        let mut row = complete_row();
        row.insert("price".into(), "10,50".into());

        let outcome = engine().validate_row(&row);
        assert!(outcome.is_valid, "{:?}", outcome.errors);
        assert!(outcome.corrections.is_empty());
    }

    #[test]
    fn test_numeric_checks() {
        let mut row = complete_row();
        row.insert("price".into(), "12.345".into());
        row.insert("stock".into(), "2.5".into());

        let outcome = engine().validate_row(&row);
        assert_eq!(codes(&outcome), vec!["PRICE_DECIMAL_PLACES", "STOCK_NOT_INTEGER"]);

        row.insert("price".into(), "abc".into());
        row.insert("stock".into(), "-1".into());
        let outcome = engine().validate_row(&row);
        assert_eq!(codes(&outcome), vec!["PRICE_NOT_NUMERIC", "STOCK_BELOW_MIN"]);

        row.insert("price".into(), CellValue::Float(50000.0));
        row.insert("stock".into(), CellValue::Int(1));
        let outcome = engine().validate_row(&row);
        assert_eq!(codes(&outcome), vec!["PRICE_ABOVE_MAX"]);
    }

    #[test]
    fn test_custom_attributes() {
        let mut row = complete_row();
        row.insert("voltage".into(), "380V".into());
        row.insert("is_kit".into(), "talvez".into());
        row.insert("model".into(), "X50-PRO-MAX".into());

        let outcome = engine().validate_row(&row);
        assert_eq!(
            codes(&outcome),
            vec!["IS_KIT_INVALID_VALUE", "MODEL_TOO_LONG", "VOLTAGE_INVALID_VALUE"]
        );

        for token in ["SIM", "nao", "1", "False", "yes"] {
            let mut row = complete_row();
            row.insert("is_kit".into(), token.into());
            assert!(engine().validate_row(&row).is_valid, "{} should be accepted", token);
        }
    }

    #[test]
    fn test_warnings_never_invalidate() {
        let mut row = complete_row();
        row.remove("description");
        row.remove("image_3");

        let outcome = engine().validate_row(&row);
        assert!(outcome.is_valid);
        assert_eq!(codes(&outcome), vec!["DESCRIPTION_MISSING", "INSUFFICIENT_IMAGES"]);
        assert!(outcome.errors.iter().all(|e| e.severity == Severity::Warning));
    }

    #[test]
    fn test_image_counting() {
        let row = row_of([
            ("images", "a.jpg;b.jpg| c.jpg"),
            ("picture_1", "d.jpg"),
            ("image_2", ""),
            ("main_image_url", "e.jpg"),
        ]);
        assert_eq!(count_images(&row), 4);
    }
}
