//! Evaluation contexts.
//!
//! A [`ValidationScope`] is created once per validation run and carries the
//! marketplace and category being validated. A [`ValidationContext`] is
//! derived from it for every evaluated cell and borrows the row it belongs
//! to, so cross-field rules can look at sibling columns.

use crate::{CellValue, Row, normalize_marketplace};
use std::collections::HashMap;

/// Run-level context shared by every cell of one validation call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationScope {
    /// Normalized marketplace identifier (e.g. "mercadolivre")
    pub marketplace: String,

    /// Product category identifier
    pub category: String,

    /// Additional free-form context
    pub metadata: HashMap<String, String>,
}

impl ValidationScope {
    /// Creates a scope, normalizing the marketplace identifier.
    pub fn new(marketplace: impl AsRef<str>, category: impl Into<String>) -> Self {
        Self {
            marketplace: normalize_marketplace(marketplace.as_ref()),
            category: category.into(),
            metadata: HashMap::new(),
        }
    }

    /// Adds metadata to the scope.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Derives the per-cell context for `column` of `row`.
    pub fn cell<'a>(
        &'a self,
        row_number: usize,
        column: &'a str,
        row: &'a Row,
    ) -> ValidationContext<'a> {
        ValidationContext {
            scope: self,
            row_number,
            column_name: column,
            row_data: row,
        }
    }
}

/// Per-cell evaluation context.
///
/// Borrowed and immutable for the duration of a rule call; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    scope: &'a ValidationScope,

    /// 1-based data row number (header excluded)
    pub row_number: usize,

    /// Column being evaluated
    pub column_name: &'a str,

    /// Read-only snapshot of the whole row
    pub row_data: &'a Row,
}

impl<'a> ValidationContext<'a> {
    /// Returns the marketplace identifier.
    pub fn marketplace(&self) -> &'a str {
        &self.scope.marketplace
    }

    /// Returns the category identifier.
    pub fn category(&self) -> &'a str {
        &self.scope.category
    }

    /// Returns the run metadata.
    pub fn metadata(&self) -> &'a HashMap<String, String> {
        &self.scope.metadata
    }

    /// Returns the scope this context was derived from.
    pub fn scope(&self) -> &'a ValidationScope {
        self.scope
    }

    /// Looks up a sibling column of the current row.
    pub fn field(&self, column: &str) -> Option<&'a CellValue> {
        self.row_data.get(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row_of;

    #[test]
    fn test_scope_normalizes_marketplace() {
        let scope = ValidationScope::new("Mercado Livre", "electronics");
        assert_eq!(scope.marketplace, "mercadolivre");
        assert_eq!(scope.category, "electronics");
    }

    #[test]
    fn test_cell_context_exposes_row() {
        let scope = ValidationScope::new("amazon", "books").with_metadata("job", "42");
        let row = row_of([("title", "Dune"), ("isbn", "9780441013593")]);
        let ctx = scope.cell(3, "title", &row);

        assert_eq!(ctx.row_number, 3);
        assert_eq!(ctx.column_name, "title");
        assert_eq!(ctx.marketplace(), "amazon");
        assert_eq!(ctx.category(), "books");
        assert_eq!(ctx.metadata().get("job").map(String::as_str), Some("42"));
        assert_eq!(ctx.field("isbn"), Some(&CellValue::from("9780441013593")));
        assert_eq!(ctx.field("missing"), None);
    }
}
