//! Marketplace rule providers.
//!
//! The hard-coded providers describe each marketplace's listing format in
//! code; [`YamlRuleProvider`] builds the same shape from a ruleset document.

mod amazon;
mod mercadolivre;
mod shopee;
mod yaml;

pub use amazon::AmazonProvider;
pub use mercadolivre::MercadoLivreProvider;
pub use shopee::ShopeeProvider;
pub use yaml::{YamlRuleProvider, compile_spec};

use crate::rule::{Rule, SharedRule};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Accumulates ordered rules per column.
#[derive(Debug, Default)]
pub(crate) struct ColumnRules {
    columns: BTreeMap<String, Vec<SharedRule>>,
}

impl ColumnRules {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Appends a rule to `column`.
    pub(crate) fn rule(mut self, column: &str, rule: impl Rule + 'static) -> Self {
        self.push(column, Arc::new(rule));
        self
    }

    pub(crate) fn push(&mut self, column: &str, rule: SharedRule) {
        self.columns.entry(column.to_string()).or_default().push(rule);
    }

    pub(crate) fn build(self) -> BTreeMap<String, Vec<SharedRule>> {
        self.columns
    }
}
