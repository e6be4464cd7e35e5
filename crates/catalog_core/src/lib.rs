//! # Catalog Rules Core
//!
//! Core data structures and types for the Catalog Rules Engine.
//!
//! This crate provides the building blocks shared by the rule engine, the
//! policy loader and the validation pipeline: the tabular input model, the
//! per-cell evaluation context, rule-level violations and the serializable
//! result types handed back to API and worker layers.
//!
//! ## Key Concepts
//!
//! - **Table / Row / CellValue**: already-normalized tabular input
//! - **ValidationScope / ValidationContext**: marketplace + category, and the
//!   per-cell view of a row
//! - **RuleViolation**: one failed check produced by a rule
//! - **ValidationItem / ValidationSummary / ValidationResult**: per-row and dataset-level output
//!
//! ## Example
//!
//! ```rust
//! use catalog_core::{row_of, Table, ValidationItem, ValidationResultBuilder};
//! use std::time::Duration;
//!
//! let table = Table::from_rows(vec![row_of([("title", "Phone"), ("price", "10.99")])]);
//!
//! let result = ValidationResultBuilder::new("mercadolivre", "electronics")
//!     .item(ValidationItem::new(1, vec![], vec![]))
//!     .build(table.len(), Duration::ZERO);
//!
//! assert!(result.is_valid());
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod marketplace;
pub mod report;
pub mod value;
pub mod violation;

pub use builder::*;
pub use context::*;
pub use error::*;
pub use marketplace::*;
pub use report::*;
pub use value::*;
pub use violation::*;
