//! Ruleset documents for the compiled rule engine.
//!
//! A ruleset lists, per column, the ordered rules a YAML-backed provider
//! compiles into rule objects. Files live at
//! `{rulesets_dir}/{marketplace}.yaml` with `{rulesets_dir}/default.yaml` as
//! the fallback.

use crate::{PolicyError, Result, normalize_category};
use catalog_core::{Severity, normalize_marketplace};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// One rule declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    /// Value must be present and non-blank
    Required,
    /// String length upper bound
    MaxLength {
        /// Maximum length in characters
        max: usize,
    },
    /// String length lower bound
    MinLength {
        /// Minimum length in characters
        min: usize,
    },
    /// Value must match a regex
    Regex {
        /// Regular expression pattern
        pattern: String,
    },
    /// Value must be a well-formed URL
    Url,
    /// Value must be a URL pointing at an image
    ImageUrl,
    /// Value must be one of a fixed set
    Enum {
        /// Allowed values
        values: Vec<String>,
    },
    /// Numeric value within bounds
    NumericRange {
        /// Minimum value (inclusive)
        min: f64,
        /// Maximum value (inclusive)
        max: f64,
    },
    /// Numeric value greater than zero
    PositiveNumber,
    /// Whole number
    Integer,
    /// Non-negative whole number
    StockQuantity,
}

impl RuleKind {
    /// Stable identifier of the rule kind.
    pub fn name(&self) -> &'static str {
        match self {
            RuleKind::Required => "required",
            RuleKind::MaxLength { .. } => "max_length",
            RuleKind::MinLength { .. } => "min_length",
            RuleKind::Regex { .. } => "regex",
            RuleKind::Url => "url",
            RuleKind::ImageUrl => "image_url",
            RuleKind::Enum { .. } => "enum",
            RuleKind::NumericRange { .. } => "numeric_range",
            RuleKind::PositiveNumber => "positive_number",
            RuleKind::Integer => "integer",
            RuleKind::StockQuantity => "stock_quantity",
        }
    }
}

/// A rule declaration with its optional overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    /// What the rule checks
    #[serde(flatten)]
    pub kind: RuleKind,

    /// Severity override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Message override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<RuleKind> for RuleSpec {
    fn from(kind: RuleKind) -> Self {
        Self {
            kind,
            severity: None,
            message: None,
        }
    }
}

/// Column rules layered on top of the base set for one category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryRules {
    /// Column name to ordered rules; `"*"` applies to every column
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<RuleSpec>>,
}

/// A marketplace ruleset document.
///
/// # Example
///
/// ```rust
/// use catalog_policy::{parse_ruleset_yaml, RuleKind};
///
/// let yaml = r#"
/// marketplace: amazon
/// columns:
///   title:
///     - type: required
///     - type: max_length
///       max: 200
/// "#;
///
/// let ruleset = parse_ruleset_yaml(yaml).unwrap();
/// assert_eq!(ruleset.columns["title"][1].kind, RuleKind::MaxLength { max: 200 });
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDocument {
    /// Marketplace identifier
    #[serde(default)]
    pub marketplace: String,

    /// Base column rules; `"*"` applies to every column
    #[serde(default)]
    pub columns: BTreeMap<String, Vec<RuleSpec>>,

    /// Category-specific additions
    #[serde(default)]
    pub categories: BTreeMap<String, CategoryRules>,
}

impl RuleSetDocument {
    /// Returns base plus category columns, base rules first within a column.
    ///
    /// Category names are compared in their normalized form, so
    /// `"Home Appliances"` and `"home-appliances"` select the same section.
    pub fn columns_for(&self, category: &str) -> BTreeMap<String, Vec<RuleSpec>> {
        let wanted = normalize_category(category);
        let mut merged = self.columns.clone();
        let sections = self
            .categories
            .iter()
            .filter(|(name, _)| normalize_category(name) == wanted);
        for (_, extra) in sections {
            for (column, specs) in &extra.columns {
                merged
                    .entry(column.clone())
                    .or_default()
                    .extend(specs.iter().cloned());
            }
        }
        merged
    }
}

/// Parses a ruleset from a YAML string.
pub fn parse_ruleset_yaml(content: &str) -> Result<RuleSetDocument> {
    let ruleset: RuleSetDocument = serde_yaml_ng::from_str(content)?;
    Ok(ruleset)
}

/// Reads ruleset documents from a directory.
#[derive(Debug, Clone)]
pub struct RulesetLoader {
    dir: PathBuf,
}

impl RulesetLoader {
    /// File stem of the fallback ruleset.
    pub const DEFAULT_STEM: &'static str = "default";

    /// Creates a loader rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the rulesets directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the ruleset for `marketplace`, falling back to `default.yaml`.
    ///
    /// Missing both files is an error: the compiled engine fails fast on
    /// configuration problems.
    pub fn load(&self, marketplace: &str) -> Result<RuleSetDocument> {
        let marketplace = normalize_marketplace(marketplace);

        for stem in [marketplace.as_str(), Self::DEFAULT_STEM] {
            if let Some(path) = self.find(stem) {
                info!("Loading ruleset for '{}' from {}", marketplace, path.display());
                let content =
                    std::fs::read_to_string(&path).map_err(|e| PolicyError::io(&path, e))?;
                let mut ruleset = parse_ruleset_yaml(&content)?;
                if ruleset.marketplace.is_empty() {
                    ruleset.marketplace = marketplace.clone();
                }
                return Ok(ruleset);
            }
            debug!("No ruleset file '{}' in {}", stem, self.dir.display());
        }

        Err(PolicyError::NotFound(format!(
            "ruleset for '{}' (and no {}.yaml) in {}",
            marketplace,
            Self::DEFAULT_STEM,
            self.dir.display()
        )))
    }

    /// Lists marketplaces with a ruleset file, excluding the fallback.
    pub fn available(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|e| PolicyError::io(&self.dir, e))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| has_yaml_extension(path))
            .filter_map(|path| path.file_stem()?.to_str().map(String::from))
            .filter(|stem| stem != Self::DEFAULT_STEM)
            .collect();
        names.sort();
        names.dedup();
        Ok(names)
    }

    fn find(&self, stem: &str) -> Option<PathBuf> {
        ["yaml", "yml"]
            .iter()
            .map(|ext| self.dir.join(format!("{}.{}", stem, ext)))
            .find(|path| path.is_file())
    }
}

pub(crate) fn has_yaml_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| matches!(ext.to_lowercase().as_str(), "yaml" | "yml"))
        .unwrap_or(false)
}
