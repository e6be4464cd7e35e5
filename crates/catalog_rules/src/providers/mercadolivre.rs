//! Mercado Livre listing rules.

use super::ColumnRules;
use crate::provider::{ProviderRules, RuleProvider};
use crate::rule::{CategoryScopedRule, SharedRule};
use crate::{
    EnumRule, ImageUrlRule, MaxLengthRule, NumericRangeRule, RegexRule, RequiredFieldRule, Result,
    StockQuantityRule,
};
use catalog_core::ValidationScope;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Categories where `brand` is mandatory.
pub const BRAND_REQUIRED_CATEGORIES: &[&str] = &["electronics", "celulares", "informatica"];

/// Number of `image_N` columns checked.
pub const MAX_PICTURES: usize = 6;

/// Rules for Mercado Livre listings.
///
/// | column          | rules                                                   |
/// |-----------------|---------------------------------------------------------|
/// | `title`         | required, at most 60 characters                         |
/// | `price`         | required, 0.01 to 999999.99 with two decimals           |
/// | `stock`         | required, non-negative whole number                     |
/// | `condition`     | `new`, `used` or `not_specified`                        |
/// | `listing_type`  | `gold_special`, `gold_pro` or `free`                    |
/// | `brand`         | required in electronics, celulares and informatica      |
/// | `gtin`          | 8, 12, 13 or 14 digits                                  |
/// | `image_1..6`    | image URL                                               |
/// | `warranty`      | at most 60 characters                                   |
/// | `description`   | at most 50000 characters                                |
/// | `category_id`   | `MLB` followed by digits                                |
#[derive(Debug, Clone)]
pub struct MercadoLivreProvider {
    columns: BTreeMap<String, Vec<SharedRule>>,
}

impl MercadoLivreProvider {
    /// Builds the provider.
    pub fn new() -> Result<Self> {
        let mut rules = ColumnRules::new()
            .rule("title", RequiredFieldRule::new())
            .rule("title", MaxLengthRule::new(60))
            .rule("price", RequiredFieldRule::new())
            .rule(
                "price",
                NumericRangeRule::new(0.01, 999_999.99)?.with_decimal_places(2),
            )
            .rule("stock", RequiredFieldRule::new())
            .rule("stock", StockQuantityRule::new())
            .rule("condition", EnumRule::new(["new", "used", "not_specified"]))
            .rule(
                "listing_type",
                EnumRule::new(["gold_special", "gold_pro", "free"]),
            )
            .rule(
                "brand",
                CategoryScopedRule::new(
                    Arc::new(RequiredFieldRule::new()),
                    BRAND_REQUIRED_CATEGORIES,
                ),
            )
            .rule(
                "gtin",
                RegexRule::new(
                    r"^(\d{8}|\d{12}|\d{13}|\d{14})$",
                    "GTIN must have 8, 12, 13 or 14 digits",
                )?
                .with_code("INVALID_GTIN"),
            )
            .rule("warranty", MaxLengthRule::new(60))
            .rule("description", MaxLengthRule::new(50_000))
            .rule(
                "category_id",
                RegexRule::new(r"^MLB\d+$", "Category id must look like MLB1234")?
                    .with_code("INVALID_CATEGORY_ID"),
            );

        let images: SharedRule = Arc::new(ImageUrlRule::new());
        for n in 1..=MAX_PICTURES {
            rules.push(&format!("image_{}", n), Arc::clone(&images));
        }

        Ok(Self {
            columns: rules.build(),
        })
    }
}

impl RuleProvider for MercadoLivreProvider {
    fn name(&self) -> &str {
        "mercadolivre"
    }

    fn rules(&self, _scope: &ValidationScope) -> ProviderRules {
        ProviderRules::Columns(self.columns.clone())
    }
}
