//! Builders for validation output.
//!
//! [`CorrectedTableBuilder`] never touches the input table: it records
//! corrections and assembles a fresh table from the original plus the
//! recorded values, so the set of changed cells is always the list of
//! [`CorrectionDetail`]s it was given.

use crate::{CorrectionDetail, Row, Table, ValidationItem, ValidationResult, ValidationSummary};
use chrono::Utc;
use std::collections::BTreeMap;
use std::time::Duration;

/// Assembles a corrected copy of a table.
///
/// # Example
///
/// ```rust
/// use catalog_core::{row_of, CellValue, CorrectedTableBuilder, CorrectionDetail, Table};
///
/// let original = Table::from_rows(vec![row_of([("title", "  Phone ")])]);
/// let fix = CorrectionDetail::new("title", "  Phone ".into(), "Phone".into(), "trim").unwrap();
///
/// let mut builder = CorrectedTableBuilder::new(&original);
/// builder.record(1, &fix);
/// let corrected = builder.build();
///
/// assert_eq!(corrected.get_row(0).unwrap()["title"], CellValue::from("Phone"));
/// assert_eq!(original.get_row(0).unwrap()["title"], CellValue::from("  Phone "));
/// ```
#[derive(Debug)]
pub struct CorrectedTableBuilder<'a> {
    original: &'a Table,
    overrides: BTreeMap<usize, Row>,
}

impl<'a> CorrectedTableBuilder<'a> {
    /// Creates a builder over `original`.
    pub fn new(original: &'a Table) -> Self {
        Self {
            original,
            overrides: BTreeMap::new(),
        }
    }

    /// Records one correction for a 1-based row number.
    ///
    /// Corrections for rows outside the table are ignored.
    pub fn record(&mut self, row_number: usize, correction: &CorrectionDetail) {
        if row_number == 0 || row_number > self.original.len() {
            return;
        }
        self.overrides
            .entry(row_number - 1)
            .or_default()
            .insert(correction.field.clone(), correction.corrected_value.clone());
    }

    /// Records every correction of an item.
    pub fn record_item(&mut self, item: &ValidationItem) {
        for correction in &item.corrections {
            self.record(item.row_number, correction);
        }
    }

    /// Number of cells that will differ from the original.
    pub fn changed_cells(&self) -> usize {
        self.overrides.values().map(|r| r.len()).sum()
    }

    /// Builds the corrected table, row by row, field by field.
    ///
    /// A correction for a column the row lacks adds that column; the header
    /// grows accordingly.
    pub fn build(self) -> Table {
        let rows = self
            .original
            .rows()
            .enumerate()
            .map(|(idx, row)| {
                let mut row = row.clone();
                if let Some(changes) = self.overrides.get(&idx) {
                    for (column, value) in changes {
                        row.insert(column.clone(), value.clone());
                    }
                }
                row
            })
            .collect();

        Table::with_columns(self.original.columns().to_vec(), rows)
    }
}

/// Builder for a [`ValidationResult`].
///
/// # Example
///
/// ```rust
/// use catalog_core::{ValidationItem, ValidationResultBuilder};
/// use std::time::Duration;
///
/// let result = ValidationResultBuilder::new("amazon", "books")
///     .item(ValidationItem::new(1, vec![], vec![]))
///     .job_id("job-7")
///     .build(1, Duration::from_millis(3));
///
/// assert_eq!(result.summary.valid_rows, 1);
/// assert_eq!(result.job_id.as_deref(), Some("job-7"));
/// ```
#[derive(Debug, Default)]
pub struct ValidationResultBuilder {
    marketplace: String,
    category: String,
    items: Vec<ValidationItem>,
    corrected_data: Option<Table>,
    auto_fix_applied: bool,
    job_id: Option<String>,
}

impl ValidationResultBuilder {
    /// Creates a builder for the given marketplace and category.
    pub fn new(marketplace: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            marketplace: marketplace.into(),
            category: category.into(),
            ..Default::default()
        }
    }

    /// Adds an item.
    pub fn item(mut self, item: ValidationItem) -> Self {
        self.items.push(item);
        self
    }

    /// Adds multiple items.
    pub fn items(mut self, items: Vec<ValidationItem>) -> Self {
        self.items.extend(items);
        self
    }

    /// Sets the corrected data and marks auto-fix as applied.
    pub fn corrected_data(mut self, table: Table) -> Self {
        self.corrected_data = Some(table);
        self.auto_fix_applied = true;
        self
    }

    /// Sets the correlation id.
    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Sets the optional correlation id.
    pub fn maybe_job_id(mut self, job_id: Option<String>) -> Self {
        self.job_id = job_id;
        self
    }

    /// Builds the result, sorting items by row number and computing the summary.
    pub fn build(mut self, total_rows: usize, elapsed: Duration) -> ValidationResult {
        self.items.sort_by_key(|item| item.row_number);
        let summary = ValidationSummary::from_items(total_rows, &self.items, elapsed);

        ValidationResult {
            items: self.items,
            summary,
            corrected_data: self.corrected_data,
            marketplace: self.marketplace,
            category: self.category,
            auto_fix_applied: self.auto_fix_applied,
            job_id: self.job_id,
            validated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CellValue, row_of};
    use pretty_assertions::assert_eq;

    fn sample_table() -> Table {
        Table::with_columns(
            vec!["title".to_string(), "price".to_string()],
            vec![
                row_of([("title", "A"), ("price", "10,50")]),
                row_of([("title", "B"), ("price", "3")]),
            ],
        )
    }

    #[test]
    fn test_build_leaves_original_untouched() {
        let original = sample_table();
        let snapshot = original.clone();
        let fix = CorrectionDetail::new(
            "price",
            CellValue::from("10,50"),
            CellValue::from("10.50"),
            "decimal_separator",
        )
        .unwrap();

        let mut builder = CorrectedTableBuilder::new(&original);
        builder.record(1, &fix);
        assert_eq!(builder.changed_cells(), 1);
        let corrected = builder.build();

        assert_eq!(original, snapshot);
        assert_eq!(corrected.len(), original.len());
        assert_eq!(corrected.columns(), original.columns());
        assert_eq!(corrected.get_row(0).unwrap()["price"], CellValue::from("10.50"));
        assert_eq!(corrected.get_row(1), original.get_row(1));
    }

    #[test]
    fn test_out_of_range_rows_ignored() {
        let original = sample_table();
        let fix = CorrectionDetail::new("title", "A".into(), "B".into(), "x").unwrap();

        let mut builder = CorrectedTableBuilder::new(&original);
        builder.record(0, &fix);
        builder.record(9, &fix);
        assert_eq!(builder.changed_cells(), 0);
        assert_eq!(builder.build(), original);
    }

    #[test]
    fn test_correction_for_missing_column_is_added() {
        let original = Table::from_rows(vec![
            row_of([("title", "A")]),
            row_of([("title", "B"), ("price", "3")]),
        ]);
        let fix = CorrectionDetail::new("price", CellValue::Null, "0.01".into(), "default_price")
            .unwrap();

        let mut builder = CorrectedTableBuilder::new(&original);
        builder.record(1, &fix);
        let corrected = builder.build();

        assert_eq!(corrected.get_row(0).unwrap()["price"], CellValue::from("0.01"));
        assert_eq!(corrected.columns(), ["title", "price"]);
        assert!(!original.get_row(0).unwrap().contains_key("price"));
    }

    #[test]
    fn test_result_builder_sorts_items() {
        let result = ValidationResultBuilder::new("shopee", "toys")
            .item(ValidationItem::new(2, vec![], vec![]))
            .item(ValidationItem::new(1, vec![], vec![]))
            .build(2, Duration::ZERO);

        let numbers: Vec<_> = result.items.iter().map(|i| i.row_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert!(!result.auto_fix_applied);
        assert!(result.corrected_data.is_none());
    }
}
