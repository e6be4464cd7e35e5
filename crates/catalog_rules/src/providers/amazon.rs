//! Amazon listing rules.

use super::ColumnRules;
use crate::provider::{ProviderRules, RuleProvider};
use crate::rule::SharedRule;
use crate::{
    EnumRule, ImageUrlRule, MaxLengthRule, PositiveNumberRule, RegexRule, RequiredFieldRule,
    Result, StockQuantityRule,
};
use catalog_core::ValidationScope;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Number of `bullet_point_N` columns checked.
pub const BULLET_POINTS: usize = 5;

/// Rules for Amazon listings.
#[derive(Debug, Clone)]
pub struct AmazonProvider {
    columns: BTreeMap<String, Vec<SharedRule>>,
}

impl AmazonProvider {
    /// Builds the provider.
    pub fn new() -> Result<Self> {
        let mut rules = ColumnRules::new()
            .rule("sku", RequiredFieldRule::new())
            .rule(
                "sku",
                RegexRule::new(
                    r"^[A-Za-z0-9._-]{1,40}$",
                    "SKU may only contain letters, digits, '.', '-' and '_' (max 40)",
                )?
                .with_code("INVALID_SKU"),
            )
            .rule("title", RequiredFieldRule::new())
            .rule("title", MaxLengthRule::new(200))
            .rule("brand", RequiredFieldRule::new())
            .rule("price", RequiredFieldRule::new())
            .rule("price", PositiveNumberRule::new())
            .rule("quantity", StockQuantityRule::new())
            .rule(
                "product_id_type",
                EnumRule::new(["UPC", "EAN", "GTIN", "ASIN", "ISBN"]),
            )
            .rule("main_image_url", ImageUrlRule::new());

        let bullet: SharedRule = Arc::new(MaxLengthRule::new(500));
        for n in 1..=BULLET_POINTS {
            rules.push(&format!("bullet_point_{}", n), Arc::clone(&bullet));
        }

        Ok(Self {
            columns: rules.build(),
        })
    }
}

impl RuleProvider for AmazonProvider {
    fn name(&self) -> &str {
        "amazon"
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
    fn test_amazon_rules() {
        let mut engine = RuleEngine::new();
        engine.register_provider(AmazonProvider::new().unwrap());
        let scope = ValidationScope::new("Amazon", "books");

        let row = row_of([
            ("sku", "BOOK 001"),
            ("title", "Dom Casmurro"),
            ("brand", "Penguin"),
            ("price", "0"),
            ("quantity", "3"),
            ("product_id_type", "isbn"),
            ("main_image_url", "https://m.media-amazon.com/images/I/cover.jpg"),
            ("bullet_point_2", "y".repeat(501).as_str()),
        ]);

        let codes: Vec<_> = engine
            .validate_row(&row, 1, &scope)
            .into_iter()
            .map(|v| v.code)
            .collect();
        assert_eq!(
            codes,
            vec!["MAX_LENGTH", "NOT_POSITIVE", "INVALID_ENUM", "INVALID_SKU"]
        );
    }
}
