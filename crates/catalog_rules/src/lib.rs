//! # Catalog Rules
//!
//! Validation rules for marketplace product listings. This crate provides:
//!
//! - The [`Rule`] trait and a library of reusable rules (required, length,
//!   regex, URL, enum, numeric range, stock quantity)
//! - Marketplace providers for Mercado Livre, Amazon and Shopee, plus a
//!   provider compiled from YAML rulesets
//! - [`RuleEngine`], which merges provider rules and evaluates them cell by
//!   cell, optionally applying fixes
//! - [`PolicyRuleEngine`], which interprets a declarative policy directly
//!
//! ## Example
//!
//! ```rust
//! use catalog_core::{row_of, ValidationScope};
//! use catalog_rules::{RuleEngine, ShopeeProvider};
//!
//! let mut engine = RuleEngine::new();
//! engine.register_provider(ShopeeProvider::new().unwrap());
//!
//! let scope = ValidationScope::new("shopee", "toys");
//! let row = row_of([
//!     ("name", "Toy"),
//!     ("price", "19.90"),
//!     ("stock", "4"),
//! ]);
//!
//! let outcome = engine.validate_and_fix_row(&row, 1, &scope);
//! assert_eq!(outcome.violations[0].code, "MIN_LENGTH");
//! assert!(outcome.corrections.is_empty());
//! ```

mod engine;
mod error;
mod library;
mod policy_engine;
mod provider;
mod providers;
mod rule;

pub use engine::{RowFixOutcome, RuleEngine, validate_and_fix_row, validate_row};
pub use error::{Result, RuleError};
pub use library::*;
pub use policy_engine::{BOOLEAN_TOKENS, PolicyOutcome, PolicyRuleEngine, count_images};
pub use provider::{ProviderRules, RuleProvider, RuleSet, WILDCARD};
pub use providers::{
    AmazonProvider, MercadoLivreProvider, ShopeeProvider, YamlRuleProvider, compile_spec,
};
pub use rule::{CategoryScopedRule, ConfiguredRule, Fix, Rule, SharedRule};
