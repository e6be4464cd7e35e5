//! Provider compiled from a ruleset document.

use crate::provider::{ProviderRules, RuleProvider};
use crate::rule::{ConfiguredRule, SharedRule};
use crate::{
    EnumRule, ImageUrlRule, IntegerRule, MaxLengthRule, MinLengthRule, NumericRangeRule,
    PositiveNumberRule, RegexRule, RequiredFieldRule, Result, StockQuantityRule, UrlRule,
};
use catalog_core::ValidationScope;
use catalog_policy::{RuleKind, RuleSetDocument, RuleSpec, RulesetLoader, normalize_category};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type Columns = BTreeMap<String, Vec<SharedRule>>;

/// Rules declared in a YAML ruleset.
///
/// Every declaration is compiled once, at construction; an invalid pattern
/// or inverted range fails the whole provider.
///
/// # Example
///
/// ```rust
/// use catalog_core::{row_of, ValidationScope};
/// use catalog_policy::parse_ruleset_yaml;
/// use catalog_rules::{RuleEngine, YamlRuleProvider};
///
/// let document = parse_ruleset_yaml(r#"
/// marketplace: magalu
/// columns:
///   title:
///     - type: required
///     - type: max_length
///       max: 150
/// "#).unwrap();
///
/// let mut engine = RuleEngine::new();
/// engine.register_provider(YamlRuleProvider::from_document(&document).unwrap());
///
/// let scope = ValidationScope::new("magalu", "default");
/// let violations = engine.validate_row(&row_of([("title", "")]), 1, &scope);
/// assert_eq!(violations[0].code, "REQUIRED_FIELD");
/// ```
#[derive(Debug, Clone)]
pub struct YamlRuleProvider {
    name: String,
    base: Columns,
    categories: BTreeMap<String, Columns>,
}

impl YamlRuleProvider {
    /// Compiles a ruleset document.
    ///
    /// Each category section is compiled together with the base columns, so
    /// a lookup returns the full column set for that category.
    pub fn from_document(document: &RuleSetDocument) -> Result<Self> {
        let base = compile_columns(&document.columns)?;
        let categories = document
            .categories
            .keys()
            .map(|category| {
                let columns = compile_columns(&document.columns_for(category))?;
                Ok((normalize_category(category), columns))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        debug!(
            "Compiled ruleset for '{}': {} columns, {} category sections",
            document.marketplace,
            base.len(),
            categories.len()
        );

        Ok(Self {
            name: format!("yaml:{}", document.marketplace),
            base,
            categories,
        })
    }

    /// Loads and compiles the ruleset for `marketplace`.
    pub fn load(loader: &RulesetLoader, marketplace: &str) -> Result<Self> {
        let document = loader.load(marketplace)?;
        Self::from_document(&document)
    }
}

impl RuleProvider for YamlRuleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self, scope: &ValidationScope) -> ProviderRules {
        let columns = self
            .categories
            .get(&normalize_category(&scope.category))
            .unwrap_or(&self.base);
        ProviderRules::Columns(columns.clone())
    }
}

fn compile_columns(columns: &BTreeMap<String, Vec<RuleSpec>>) -> Result<Columns> {
    columns
        .iter()
        .map(|(column, specs)| {
            let rules = specs.iter().map(compile_spec).collect::<Result<Vec<_>>>()?;
            Ok((column.clone(), rules))
        })
        .collect()
}

/// Compiles one declaration into a rule.
pub fn compile_spec(spec: &RuleSpec) -> Result<SharedRule> {
    let rule: SharedRule = match &spec.kind {
        RuleKind::Required => Arc::new(RequiredFieldRule::new()),
        RuleKind::MaxLength { max } => Arc::new(MaxLengthRule::new(*max)),
        RuleKind::MinLength { min } => Arc::new(MinLengthRule::new(*min)),
        RuleKind::Regex { pattern } => {
            let message = spec
                .message
                .clone()
                .unwrap_or_else(|| format!("Value must match the pattern {}", pattern));
            Arc::new(RegexRule::new(pattern, message)?)
        }
        RuleKind::Url => Arc::new(UrlRule::new()),
        RuleKind::ImageUrl => Arc::new(ImageUrlRule::new()),
        RuleKind::Enum { values } => Arc::new(EnumRule::new(values.iter().cloned())),
        RuleKind::NumericRange { min, max } => Arc::new(NumericRangeRule::new(*min, *max)?),
        RuleKind::PositiveNumber => Arc::new(PositiveNumberRule::new()),
        RuleKind::Integer => Arc::new(IntegerRule::new()),
        RuleKind::StockQuantity => Arc::new(StockQuantityRule::new()),
    };

    if spec.severity.is_none() && spec.message.is_none() {
        return Ok(rule);
    }
    Ok(Arc::new(ConfiguredRule::new(
        rule,
        spec.severity,
        spec.message.clone(),
    )))
}
