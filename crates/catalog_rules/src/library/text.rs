//! Presence, length, format and membership rules.

use super::{is_missing, text_of};
use crate::rule::{Fix, Rule};
use crate::{Result, RuleError};
use catalog_core::{CellValue, RuleViolation, Severity, ValidationContext};
use regex::Regex;
use std::sync::LazyLock;

/// Extensions accepted by [`ImageUrlRule`].
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".bmp", ".tiff"];

// scheme://host[:port][/path][?query][#fragment]; capture 2 is the path.
static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,63}|localhost|\d{1,3}(?:\.\d{1,3}){3})(:\d{1,5})?(/[^\s?#]*)?(?:\?[^\s#]*)?(?:#\S*)?$",
    )
    .expect("valid URL regex")
});

/// Returns the path of a well-formed http(s) URL, or `None` if malformed.
fn url_path(url: &str) -> Option<String> {
    let captures = URL_RE.captures(url)?;
    Some(
        captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default(),
    )
}

/// Proposes a scheme-prefixed, trimmed version of a malformed URL.
fn repair_url(value: &CellValue) -> Option<Fix> {
    let text = value.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let (candidate, correction_type, confidence) = if text.contains("://") {
        (text.to_string(), "trim", 0.9)
    } else {
        (format!("https://{}", text), "add_url_scheme", 0.7)
    };
    url_path(&candidate)?;
    Some(Fix::new(candidate, correction_type, confidence))
}

/// Fails on null, blank and null-equivalent values.
#[derive(Debug, Clone, Default)]
pub struct RequiredFieldRule;

impl RequiredFieldRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for RequiredFieldRule {
    fn id(&self) -> &str {
        "required"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        if !is_missing(value) {
            return None;
        }
        Some(
            RuleViolation::new(
                ctx,
                "REQUIRED_FIELD",
                format!("Field '{}' is required", ctx.column_name),
                value,
            )
            .with_suggestion(format!("Provide a value for '{}'", ctx.column_name)),
        )
    }
}

/// Upper bound on the character count.
#[derive(Debug, Clone)]
pub struct MaxLengthRule {
    max: usize,
}

impl MaxLengthRule {
    /// Creates the rule.
    pub fn new(max: usize) -> Self {
        Self { max }
    }
}

impl Rule for MaxLengthRule {
    fn id(&self) -> &str {
        "max_length"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        let len = text.chars().count();
        if len <= self.max {
            return None;
        }
        Some(
            RuleViolation::new(
                ctx,
                "MAX_LENGTH",
                format!(
                    "Value exceeds maximum length of {} characters ({} given)",
                    self.max, len
                ),
                value,
            )
            .with_suggestion(format!("Truncate to {} characters", self.max)),
        )
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        let text = text_of(value)?;
        let truncated: String = text.chars().take(self.max).collect();
        let truncated = truncated.trim_end();
        if truncated.is_empty() {
            return None;
        }
        Some(Fix::new(truncated, "truncate", 0.8))
    }
}

/// Lower bound on the character count.
#[derive(Debug, Clone)]
pub struct MinLengthRule {
    min: usize,
}

impl MinLengthRule {
    /// Creates the rule.
    pub fn new(min: usize) -> Self {
        Self { min }
    }
}

impl Rule for MinLengthRule {
    fn id(&self) -> &str {
        "min_length"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        let len = text.chars().count();
        if len >= self.min {
            return None;
        }
        Some(
            RuleViolation::new(
                ctx,
                "MIN_LENGTH",
                format!(
                    "Value must be at least {} characters ({} given)",
                    self.min, len
                ),
                value,
            )
            .with_suggestion(format!("Expand to at least {} characters", self.min)),
        )
    }
}

/// Value must match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexRule {
    regex: Regex,
    message: String,
    code: String,
}

impl RegexRule {
    /// Compiles `pattern`; `message` is reported on mismatch.
    pub fn new(pattern: &str, message: impl Into<String>) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| RuleError::invalid_regex(pattern, e))?;
        Ok(Self {
            regex,
            message: message.into(),
            code: "INVALID_FORMAT".to_string(),
        })
    }

    /// Overrides the error code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Returns the pattern.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}

impl Rule for RegexRule {
    fn id(&self) -> &str {
        "regex"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        if self.regex.is_match(&text) {
            return None;
        }
        Some(RuleViolation::new(ctx, self.code.clone(), self.message.clone(), value))
    }
}

/// Value must be a well-formed http(s) URL.
#[derive(Debug, Clone, Default)]
pub struct UrlRule;

impl UrlRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for UrlRule {
    fn id(&self) -> &str {
        "url"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        if url_path(&text).is_some() {
            return None;
        }
        Some(
            RuleViolation::new(ctx, "INVALID_URL", "Value must be a valid http(s) URL", value)
                .with_suggestion("Use a full URL such as https://example.com/page"),
        )
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        repair_url(value)
    }
}

/// URL that should point at an image.
///
/// A malformed URL is an error; a well-formed URL without a known image
/// extension is only a warning.
#[derive(Debug, Clone, Default)]
pub struct ImageUrlRule;

impl ImageUrlRule {
    /// Creates the rule.
    pub fn new() -> Self {
        Self
    }
}

impl Rule for ImageUrlRule {
    fn id(&self) -> &str {
        "image_url"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        let Some(path) = url_path(&text) else {
            return Some(
                RuleViolation::new(ctx, "INVALID_URL", "Value must be a valid http(s) URL", value)
                    .with_suggestion("Use a full URL such as https://example.com/photo.jpg"),
            );
        };

        let path = path.to_lowercase();
        if IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) {
            return None;
        }
        Some(
            RuleViolation::new(
                ctx,
                "INVALID_IMAGE_EXTENSION",
                "URL does not point to a supported image file",
                value,
            )
            .with_severity(Severity::Warning)
            .with_suggestion(format!("Use an image ending in {}", IMAGE_EXTENSIONS.join(", "))),
        )
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        repair_url(value)
    }
}

/// Value must be one of a fixed set (exact match).
#[derive(Debug, Clone)]
pub struct EnumRule {
    allowed: Vec<String>,
}

impl EnumRule {
    /// Creates the rule.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Allowed values.
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

impl Rule for EnumRule {
    fn id(&self) -> &str {
        "enum"
    }

    fn validate(&self, value: &CellValue, ctx: &ValidationContext<'_>) -> Option<RuleViolation> {
        let text = text_of(value)?;
        if self.allowed.iter().any(|a| *a == text) {
            return None;
        }
        Some(
            RuleViolation::new(
                ctx,
                "INVALID_ENUM",
                format!(
                    "Value '{}' is not allowed; expected one of: {}",
                    text,
                    self.allowed.join(", ")
                ),
                value,
            )
            .with_suggestion(format!("Use one of: {}", self.allowed.join(", "))),
        )
    }

    fn fix(&self, value: &CellValue, _ctx: &ValidationContext<'_>) -> Option<Fix> {
        let text = text_of(value)?;
        let needle = text.trim().to_lowercase();
        let mut matches = self.allowed.iter().filter(|a| a.to_lowercase() == needle);
        let canonical = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(Fix::new(canonical.as_str(), "enum_normalization", 0.95))
    }
}
