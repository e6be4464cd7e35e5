//! Shopee listing rules.

use super::ColumnRules;
use crate::provider::{ProviderRules, RuleProvider};
use crate::rule::SharedRule;
use crate::{
    ImageUrlRule, IntegerRule, MaxLengthRule, MinLengthRule, NumericRangeRule,
    PositiveNumberRule, RequiredFieldRule, Result, StockQuantityRule,
};
use catalog_core::ValidationScope;
use std::collections::BTreeMap;

/// Rules for Shopee listings.
#[derive(Debug, Clone)]
pub struct ShopeeProvider {
    columns: BTreeMap<String, Vec<SharedRule>>,
}

impl ShopeeProvider {
    /// Builds the provider.
    pub fn new() -> Result<Self> {
        let rules = ColumnRules::new()
            .rule("name", RequiredFieldRule::new())
            .rule("name", MinLengthRule::new(10))
            .rule("name", MaxLengthRule::new(120))
            .rule("price", RequiredFieldRule::new())
            .rule("price", NumericRangeRule::new(0.1, 1_000_000.0)?)
            .rule("stock", RequiredFieldRule::new())
            .rule("stock", StockQuantityRule::new())
            .rule("weight", PositiveNumberRule::new())
            .rule("category_id", IntegerRule::new())
            .rule("image", ImageUrlRule::new());

        Ok(Self {
            columns: rules.build(),
        })
    }
}

impl RuleProvider for ShopeeProvider {
    fn name(&self) -> &str {
        "shopee"
    }

    fn rules(&self, _scope: &ValidationScope) -> ProviderRules {
        ProviderRules::Columns(self.columns.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleEngine;
    use catalog_core::row_of;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_shopee_rules() {
        let mut engine = RuleEngine::new();
        engine.register_provider(ShopeeProvider::new().unwrap());
        let scope = ValidationScope::new("shopee", "toys");

        let row = row_of([
            ("name", "Robot"),
            ("price", "0.05"),
            ("stock", "4"),
            ("weight", "abc"),
            ("category_id", "100.5"),
            ("image", "https://cf.shopee.com.br/file/robot.png"),
        ]);

        let codes: Vec<_> = engine
            .validate_row(&row, 1, &scope)
            .into_iter()
            .map(|v| (v.column, v.code))
            .collect();
        assert_eq!(
            codes,
            vec![
                ("category_id".to_string(), "NOT_INTEGER".to_string()),
                ("name".to_string(), "MIN_LENGTH".to_string()),
                ("price".to_string(), "BELOW_MINIMUM".to_string()),
                ("weight".to_string(), "NOT_NUMERIC".to_string()),
            ]
        );
    }
}
