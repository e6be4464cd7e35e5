//! Declarative policy model.
//!
//! A [`Policy`] describes, for one `(marketplace, category)` pair, how every
//! field of a listing must look. It is interpreted directly by the policy
//! rule engine without compiling rule objects.

use crate::{PolicyError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Declared value type of a policy field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (default)
    String,
    /// Decimal number
    Numeric,
    /// Whole number
    Integer,
}

/// Normalization applied to a string value before its checks run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// Strip surrounding whitespace
    Trim,
    /// Convert to upper case
    Uppercase,
    /// Convert to lower case
    Lowercase,
}

impl Transform {
    /// Applies the transform.
    pub fn apply(self, value: &str) -> String {
        match self {
            Transform::Trim => value.trim().to_string(),
            Transform::Uppercase => value.to_uppercase(),
            Transform::Lowercase => value.to_lowercase(),
        }
    }

    /// Name used as correction type.
    pub fn name(self) -> &'static str {
        match self {
            Transform::Trim => "trim",
            Transform::Uppercase => "uppercase",
            Transform::Lowercase => "lowercase",
        }
    }
}

/// Rules for one standard field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRule {
    /// Field must be present and non-empty
    pub required: bool,

    /// Declared value type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Minimum length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum length in characters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regex the value must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Allowed values
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,

    /// Compare `enum_values` ignoring case
    pub case_insensitive: bool,

    /// Minimum numeric value (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    /// Maximum numeric value (inclusive)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    /// Maximum digits after the decimal point
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decimal_places: Option<u32>,

    /// Normalization applied before string checks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<Transform>,

    /// Characters that may not appear in the value
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub forbidden_chars: Vec<String>,
}

impl FieldRule {
    /// Returns true if values of this field are checked as numbers.
    ///
    /// A field is numeric when it declares a numeric type, carries numeric
    /// bounds, or is one of the conventional `price` / `stock` columns.
    pub fn is_numeric(&self, field_name: &str) -> bool {
        match self.field_type {
            Some(FieldType::Numeric | FieldType::Integer) => true,
            Some(FieldType::String) => false,
            None => {
                self.min_value.is_some()
                    || self.max_value.is_some()
                    || self.decimal_places.is_some()
                    || matches!(field_name, "price" | "stock")
            }
        }
    }

    /// Returns true if values must be whole numbers.
    pub fn is_integer(&self, field_name: &str) -> bool {
        match self.field_type {
            Some(FieldType::Integer) => true,
            Some(_) => false,
            None => field_name == "stock",
        }
    }
}

/// Value type of a marketplace-specific custom attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeType {
    /// One of `values`
    Enum,
    /// Free text
    String,
    /// Bilingual truthy/falsy token
    Boolean,
}

/// A marketplace-specific extension field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomAttribute {
    /// Attribute value type
    #[serde(rename = "type")]
    pub attr_type: AttributeType,

    /// Attribute must be present and non-empty
    #[serde(default)]
    pub required: bool,

    /// Allowed values for enum attributes
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,

    /// Compare enum values ignoring case
    #[serde(default)]
    pub case_insensitive: bool,

    /// Maximum length for string attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regex for string attributes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
}

/// Thresholds for non-blocking warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarningRules {
    /// Warn when fewer image URLs than this are present
    pub min_images: usize,
    /// Warn when the description is missing
    pub require_description: bool,
}

impl Default for WarningRules {
    fn default() -> Self {
        Self {
            min_images: 3,
            require_description: true,
        }
    }
}

/// Declarative rule set for one `(marketplace, category)` pair.
///
/// # Example
///
/// ```rust
/// use catalog_policy::parse_policy_yaml;
///
/// let yaml = r#"
/// marketplace: mercadolivre
/// category: electronics
/// fields:
///   title:
///     required: true
///     max_length: 60
///     transform: trim
/// "#;
///
/// let policy = parse_policy_yaml(yaml).unwrap();
/// assert_eq!(policy.fields["title"].max_length, Some(60));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    /// Marketplace identifier
    #[serde(default)]
    pub marketplace: String,

    /// Category identifier
    #[serde(default)]
    pub category: String,

    /// Policy version label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Standard field rules
    #[serde(default)]
    pub fields: BTreeMap<String, FieldRule>,

    /// Marketplace-specific extension fields
    #[serde(default)]
    pub custom_attributes: BTreeMap<String, CustomAttribute>,

    /// Human-readable messages by error code
    #[serde(default)]
    pub error_codes: BTreeMap<String, String>,

    /// Non-blocking warning thresholds
    #[serde(default)]
    pub warnings: WarningRules,

    /// Set on the synthetic default policy, never read from YAML
    #[serde(skip)]
    pub fallback: bool,
}

impl Policy {
    /// Builds the synthetic minimal policy used when no file can be read.
    ///
    /// Covers title, price, stock, brand and condition.
    pub fn default_policy(marketplace: &str, category: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert(
            "title".to_string(),
            FieldRule {
                required: true,
                min_length: Some(1),
                max_length: Some(200),
                transform: Some(Transform::Trim),
                ..Default::default()
            },
        );
        fields.insert(
            "price".to_string(),
            FieldRule {
                required: true,
                field_type: Some(FieldType::Numeric),
                min_value: Some(0.01),
                decimal_places: Some(2),
                ..Default::default()
            },
        );
        fields.insert(
            "stock".to_string(),
            FieldRule {
                required: true,
                field_type: Some(FieldType::Integer),
                min_value: Some(0.0),
                ..Default::default()
            },
        );
        fields.insert(
            "brand".to_string(),
            FieldRule {
                required: true,
                max_length: Some(100),
                transform: Some(Transform::Trim),
                ..Default::default()
            },
        );
        fields.insert(
            "condition".to_string(),
            FieldRule {
                enum_values: vec!["new".into(), "used".into(), "refurbished".into()],
                case_insensitive: true,
                ..Default::default()
            },
        );

        Self {
            marketplace: marketplace.to_string(),
            category: category.to_string(),
            version: None,
            fields,
            custom_attributes: BTreeMap::new(),
            error_codes: BTreeMap::new(),
            warnings: WarningRules::default(),
            fallback: true,
        }
    }

    /// Looks up the human-readable message for an error code.
    pub fn message_for(&self, code: &str) -> Option<&str> {
        self.error_codes.get(code).map(String::as_str)
    }
}

/// Parses a policy from a YAML string.
pub fn parse_policy_yaml(content: &str) -> Result<Policy> {
    let policy: Policy = serde_yaml_ng::from_str(content)?;
    Ok(policy)
}

/// Normalizes a category name to its file-name form.
///
/// Lowercases and replaces whitespace and dashes with underscores.
pub fn normalize_category(category: &str) -> String {
    category
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() || c == '-' { '_' } else { c })
        .collect()
}

/// Structural self-check of a policy.
///
/// Returns `(is_valid, errors)`. Checks that the required top-level keys are
/// present, that every length and value range is ordered, that patterns
/// compile and that enum attributes declare their values.
pub fn validate_policy_structure(policy: &Policy) -> (bool, Vec<String>) {
    let mut errors = Vec::new();

    if policy.marketplace.trim().is_empty() {
        errors.push("Missing required key 'marketplace'".to_string());
    }
    if policy.category.trim().is_empty() {
        errors.push("Missing required key 'category'".to_string());
    }
    if policy.fields.is_empty() {
        errors.push("Missing required key 'fields' (at least one field rule)".to_string());
    }

    for (name, rule) in &policy.fields {
        if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
            if min > max {
                errors.push(format!(
                    "Field '{}': min_length ({}) is greater than max_length ({})",
                    name, min, max
                ));
            }
        }
        if let (Some(min), Some(max)) = (rule.min_value, rule.max_value) {
            if min > max {
                errors.push(format!(
                    "Field '{}': min_value ({}) is greater than max_value ({})",
                    name, min, max
                ));
            }
        }
        if let Some(pattern) = &rule.pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!("Field '{}': invalid pattern: {}", name, e));
            }
        }
    }

    for (name, attr) in &policy.custom_attributes {
        if attr.attr_type == AttributeType::Enum && attr.values.is_empty() {
            errors.push(format!(
                "Custom attribute '{}': enum attributes must declare values",
                name
            ));
        }
        if let Some(pattern) = &attr.pattern {
            if let Err(e) = Regex::new(pattern) {
                errors.push(format!("Custom attribute '{}': invalid pattern: {}", name, e));
            }
        }
    }

    (errors.is_empty(), errors)
}

/// Runs [`validate_policy_structure`] and converts failures into an error.
pub fn ensure_valid_structure(policy: &Policy) -> Result<()> {
    match validate_policy_structure(policy) {
        (true, _) => Ok(()),
        (false, errors) => Err(PolicyError::InvalidStructure(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const FULL_POLICY: &str = r#"
marketplace: mercadolivre
category: electronics
version: "2024.1"
fields:
  title:
    required: true
    min_length: 10
    max_length: 60
    transform: trim
    forbidden_chars: ["<", ">"]
  price:
    required: true
    type: numeric
    min_value: 0.01
    max_value: 999999.99
    decimal_places: 2
  condition:
    enum_values: [new, used]
    case_insensitive: true
custom_attributes:
  voltage:
    type: enum
    values: ["110V", "220V", "bivolt"]
  is_kit:
    type: boolean
error_codes:
  TITLE_TOO_LONG: "O título deve ter no máximo 60 caracteres"
warnings:
  min_images: 5
"#;

    #[test]
    fn test_parse_full_policy() {
        let policy = parse_policy_yaml(FULL_POLICY).expect("Failed to parse policy");

        assert_eq!(policy.marketplace, "mercadolivre");
        assert_eq!(policy.version.as_deref(), Some("2024.1"));
        assert_eq!(policy.fields.len(), 3);

        let title = &policy.fields["title"];
        assert!(title.required);
        assert_eq!(title.transform, Some(Transform::Trim));
        assert_eq!(title.forbidden_chars, vec!["<", ">"]);

        let price = &policy.fields["price"];
        assert_eq!(price.field_type, Some(FieldType::Numeric));
        assert_eq!(price.decimal_places, Some(2));

        assert_eq!(
            policy.custom_attributes["voltage"].attr_type,
            AttributeType::Enum
        );
        assert_eq!(
            policy.message_for("TITLE_TOO_LONG"),
            Some("O título deve ter no máximo 60 caracteres")
        );
        assert_eq!(policy.warnings.min_images, 5);
        assert!(policy.warnings.require_description);
        assert!(!policy.fallback);
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let result = parse_policy_yaml("fields: [unclosed");
        assert!(matches!(result, Err(PolicyError::YamlError(_))));
    }

    #[test]
    fn test_numeric_field_detection() {
        let plain = FieldRule::default();
        assert!(plain.is_numeric("price"));
        assert!(plain.is_integer("stock"));
        assert!(!plain.is_numeric("title"));

        let bounded = FieldRule {
            min_value: Some(1.0),
            ..Default::default()
        };
        assert!(bounded.is_numeric("weight"));

        let declared_string = FieldRule {
            field_type: Some(FieldType::String),
            ..Default::default()
        };
        assert!(!declared_string.is_numeric("price"));
    }

    #[test]
    fn test_default_policy_is_structurally_valid() {
        let policy = Policy::default_policy("shopee", "toys");
        let (valid, errors) = validate_policy_structure(&policy);

        assert!(valid, "errors: {:?}", errors);
        assert!(policy.fallback);
        for field in ["title", "price", "stock", "brand", "condition"] {
            assert!(policy.fields.contains_key(field), "missing {}", field);
        }
    }

    #[test]
    fn test_structure_errors_reported() {
        let yaml = r#"
marketplace: amazon
fields:
  title:
    min_length: 50
    max_length: 10
  price:
    min_value: 100
    max_value: 1
  sku:
    pattern: "[unclosed"
custom_attributes:
  color:
    type: enum
"#;
        let policy = parse_policy_yaml(yaml).unwrap();
        let (valid, errors) = validate_policy_structure(&policy);

        assert!(!valid);
        assert_eq!(errors.len(), 5, "errors: {:?}", errors);
        assert!(errors.iter().any(|e| e.contains("'category'")));
        assert!(errors.iter().any(|e| e.contains("min_length")));
        assert!(errors.iter().any(|e| e.contains("min_value")));
        assert!(errors.iter().any(|e| e.contains("invalid pattern")));
        assert!(errors.iter().any(|e| e.contains("declare values")));
        assert!(ensure_valid_structure(&policy).is_err());
    }

    #[test]
    fn test_missing_fields_section() {
        let policy = parse_policy_yaml("marketplace: amazon\ncategory: books\n").unwrap();
        let (valid, errors) = validate_policy_structure(&policy);
        assert!(!valid);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("'fields'"));
    }

    #[test]
    fn test_normalize_category() {
        assert_eq!(normalize_category(" Home Appliances "), "home_appliances");
        assert_eq!(normalize_category("kids-toys"), "kids_toys");
    }

    #[test]
    fn test_transforms() {
        assert_eq!(Transform::Trim.apply("  a b "), "a b");
        assert_eq!(Transform::Uppercase.apply("abc"), "ABC");
        assert_eq!(Transform::Lowercase.name(), "lowercase");
    }
}
