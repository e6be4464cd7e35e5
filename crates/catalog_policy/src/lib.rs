//! # Catalog Policy
//!
//! YAML documents that drive validation, and the loaders that resolve them.
//!
//! Two document families live here:
//!
//! - **Policies** (`{policies_dir}/{marketplace}/categories/{category}.yml`):
//!   declarative field rules interpreted directly by the policy rule engine.
//!   [`PolicyLoader`] caches them and degrades to a default policy when a
//!   document is missing or malformed.
//! - **Rulesets** (`{rulesets_dir}/{marketplace}.yaml`, fallback
//!   `default.yaml`): per-column rule declarations compiled into rule objects
//!   by the YAML rule provider. [`RulesetLoader`] fails when neither file
//!   exists.
//!
//! ## Example
//!
//! ```rust
//! use catalog_policy::{parse_policy_yaml, validate_policy_structure};
//!
//! let yaml = r#"
//! marketplace: shopee
//! category: toys
//! fields:
//!   name:
//!     required: true
//!     min_length: 10
//!     max_length: 120
//! "#;
//!
//! let policy = parse_policy_yaml(yaml).unwrap();
//! let (valid, errors) = validate_policy_structure(&policy);
//! assert!(valid, "{:?}", errors);
//! ```

mod error;
mod loader;
mod policy;
mod ruleset;
mod store;

pub use error::{PolicyError, Result};
pub use loader::PolicyLoader;
pub use policy::*;
pub use ruleset::{
    CategoryRules, RuleKind, RuleSetDocument, RuleSpec, RulesetLoader, parse_ruleset_yaml,
};
pub use store::{FsPolicyStore, MemoryPolicyStore, PolicyKey, PolicyStore};
