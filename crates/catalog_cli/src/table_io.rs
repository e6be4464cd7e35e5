//! CSV adapters between files and catalog tables.

use anyhow::{Context, Result, bail};
use catalog_core::{CellValue, Row, Table};
use std::path::Path;

/// Cell texts read as null.
const NULL_CELLS: &[&str] = &["nan", "inf", "-inf", "+inf", "infinity", "-infinity"];

/// Converts one raw CSV cell.
///
/// Empty cells and non-finite number spellings become null; everything else
/// stays text so that rules see exactly what the seller wrote.
pub fn parse_cell(raw: &str) -> CellValue {
    let lowered = raw.trim().to_lowercase();
    if raw.is_empty() || NULL_CELLS.contains(&lowered.as_str()) {
        CellValue::Null
    } else {
        CellValue::String(raw.to_string())
    }
}

/// Reads a CSV file with a header row.
///
/// Short records are padded with nulls; extra cells are ignored.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(String::is_empty) {
        bail!("CSV file has no header row: {}", path.display());
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read CSV row {}", idx + 1))?;
        let row: Row = headers
            .iter()
            .enumerate()
            .map(|(col, header)| {
                let value = record.get(col).map(parse_cell).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        rows.push(row);
    }

    Ok(Table::with_columns(headers, rows))
}

/// Writes a table as CSV, header first, nulls as empty cells.
pub fn write_table(path: &Path, table: &Table) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;

    writer.write_record(table.columns())?;
    for row in table.rows() {
        let record: Vec<String> = table
            .columns()
            .iter()
            .map(|column| row.get(column).map(CellValue::to_display).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
