//! Rule providers and the canonical compiled rule set.

use crate::rule::SharedRule;
use catalog_core::ValidationScope;
use std::collections::BTreeMap;

/// Column key that applies its rules to every column.
pub const WILDCARD: &str = "*";

/// Rules returned by a provider.
///
/// `Columns` is the column-keyed shape; `Flat` is the legacy list shape,
/// whose rules apply to every column.
#[derive(Debug, Clone)]
pub enum ProviderRules {
    /// Column name to ordered rules; a `"*"` key applies to every column
    Columns(BTreeMap<String, Vec<SharedRule>>),
    /// Rules applied to every column
    Flat(Vec<SharedRule>),
}

impl From<BTreeMap<String, Vec<SharedRule>>> for ProviderRules {
    fn from(columns: BTreeMap<String, Vec<SharedRule>>) -> Self {
        ProviderRules::Columns(columns)
    }
}

impl From<Vec<SharedRule>> for ProviderRules {
    fn from(rules: Vec<SharedRule>) -> Self {
        ProviderRules::Flat(rules)
    }
}

/// A source of rules for one marketplace.
pub trait RuleProvider: Send + Sync {
    /// Provider name, for logs.
    fn name(&self) -> &str;

    /// Rules for the given marketplace and category.
    fn rules(&self, scope: &ValidationScope) -> ProviderRules;
}

/// Column-specific and wildcard rules, merged from every provider.
///
/// Both provider shapes are normalized into this form as soon as they are
/// collected, so evaluation only ever sees one shape.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    by_column: BTreeMap<String, Vec<SharedRule>>,
    wildcard: Vec<SharedRule>,
}

impl RuleSet {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends provider rules.
    ///
    /// Rules for different columns never interact, so the merge order of
    /// providers only matters within a single column.
    pub fn merge(&mut self, rules: ProviderRules) {
        match rules {
            ProviderRules::Flat(rules) => self.wildcard.extend(rules),
            ProviderRules::Columns(columns) => {
                for (column, rules) in columns {
                    if column == WILDCARD {
                        self.wildcard.extend(rules);
                    } else {
                        self.by_column.entry(column).or_default().extend(rules);
                    }
                }
            }
        }
    }

    /// Appends one rule to the wildcard channel.
    pub fn push_wildcard(&mut self, rule: SharedRule) {
        self.wildcard.push(rule);
    }

    /// Applicable rules for `column`: column-specific first, then wildcard.
    pub fn resolve<'a>(&'a self, column: &str) -> impl Iterator<Item = &'a SharedRule> + 'a {
        self.by_column
            .get(column)
            .into_iter()
            .flatten()
            .chain(self.wildcard.iter())
    }

    /// Rules registered for one column, excluding the wildcard channel.
    pub fn column_rules(&self, column: &str) -> &[SharedRule] {
        self.by_column.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Wildcard rules.
    pub fn wildcard(&self) -> &[SharedRule] {
        &self.wildcard
    }

    /// Columns with specific rules.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.by_column.keys().map(String::as_str)
    }

    /// Total number of rules.
    pub fn len(&self) -> usize {
        self.by_column.values().map(Vec::len).sum::<usize>() + self.wildcard.len()
    }

    /// Returns true if no rule is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<ProviderRules> for RuleSet {
    fn from_iter<I: IntoIterator<Item = ProviderRules>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for rules in iter {
            set.merge(rules);
        }
        set
    }
}
