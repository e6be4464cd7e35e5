//! Tabular data representation for validation.
//!
//! This module provides the cell, row and table types the engine evaluates.
//! Adapters (CSV readers, API payloads) are expected to hand over already
//! normalized values: missing cells, `NaN` and infinities become [`CellValue::Null`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A single cell value in a catalog row.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// Null/missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    String(String),
}

impl CellValue {
    /// Returns true if this value is null or a non-finite float.
    pub fn is_null(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Float(f) => !f.is_finite(),
            _ => false,
        }
    }

    /// Returns true for null values and empty or whitespace-only strings.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::String(s) => s.trim().is_empty(),
            other => other.is_null(),
        }
    }

    /// Attempts to get this value as a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Coerces this value to a finite number.
    ///
    /// Strings are trimmed and parsed; booleans and nulls never coerce.
    pub fn as_number(&self) -> Option<f64> {
        let n = match self {
            CellValue::Int(i) => *i as f64,
            CellValue::Float(f) => *f,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            CellValue::Null | CellValue::Bool(_) => return None,
        };
        n.is_finite().then_some(n)
    }

    /// Renders the value the way it appears in a CSV cell.
    ///
    /// Null renders as an empty string.
    pub fn to_display(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Float(f) if !f.is_finite() => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_display())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<i64> for CellValue {
    fn from(i: i64) -> Self {
        CellValue::Int(i)
    }
}

impl From<f64> for CellValue {
    fn from(f: f64) -> Self {
        CellValue::Float(f)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Bool(b)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CellValue::Null, Into::into)
    }
}

/// A single catalog row, keyed by column name.
pub type Row = BTreeMap<String, CellValue>;

/// Builds a [`Row`] from `(column, value)` pairs.
///
/// ```rust
/// use catalog_core::{row_of, CellValue};
///
/// let row = row_of([("title", "Phone"), ("price", "10.99")]);
/// assert_eq!(row.get("title"), Some(&CellValue::from("Phone")));
/// ```
pub fn row_of<K, V, I>(pairs: I) -> Row
where
    K: Into<String>,
    V: Into<CellValue>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A table of catalog rows with a known header order.
///
/// Rows are addressed 1-based by row number (header excluded) in every
/// report; [`Table::get_row`] takes a 0-based index.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    /// Creates a new empty table.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a table from rows, inferring the header from the row keys.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self::empty();
        for row in rows {
            table.add_row(row);
        }
        table
    }

    /// Creates a table with an explicit header order.
    ///
    /// Columns that only appear in rows are appended to the header.
    pub fn with_columns(columns: Vec<String>, rows: Vec<Row>) -> Self {
        let mut table = Self {
            columns,
            rows: Vec::with_capacity(rows.len()),
        };
        for row in rows {
            table.add_row(row);
        }
        table
    }

    /// Returns the header in column order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns an iterator over the rows.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }

    /// Gets a row by 0-based index.
    pub fn get_row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Adds a row, extending the header with any new columns.
    pub fn add_row(&mut self, row: Row) {
        for key in row.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }
}

impl FromIterator<Row> for Table {
    fn from_iter<T: IntoIterator<Item = Row>>(iter: T) -> Self {
        Self::from_rows(iter.into_iter().collect())
    }
}
