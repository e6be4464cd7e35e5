use anyhow::Result;
use catalog_core::{Severity, ValidationResult};
use colored::*;

pub fn print_validation_result(result: &ValidationResult, format: &str) -> Result<()> {
    match format {
        "json" => print_json_result(result),
        _ => {
            print_text_result(result);
            Ok(())
        }
    }
}

fn print_text_result(result: &ValidationResult) {
    let summary = &result.summary;

    println!("\n{}", "═".repeat(60));
    println!("{}", "  CATALOG VALIDATION REPORT".bold());
    println!("{}", "═".repeat(60));
    println!("  Marketplace: {}", result.marketplace);
    println!("  Category:    {}", result.category);

    if result.is_valid() {
        println!(
            "\n{} {}",
            "✓".green().bold(),
            "Validation PASSED".green().bold()
        );
    } else {
        println!(
            "\n{} {}",
            "✗".red().bold(),
            "Validation FAILED".red().bold()
        );
    }

    let findings: Vec<_> = result.findings().collect();
    if !findings.is_empty() {
        println!("\n{}", "Findings:".bold());
        for (row_number, detail) in findings {
            let line = format!(
                "row {}: [{}] {}: {}",
                row_number, detail.code, detail.field, detail.message
            );
            match detail.severity {
                Severity::Error | Severity::Critical => println!("  {}", line.red()),
                Severity::Warning => println!("  {}", line.yellow()),
                Severity::Info => println!("  {}", line.blue()),
            }
            if let Some(suggestion) = &detail.suggestion {
                println!("      hint: {}", suggestion);
            }
        }
    }

    let corrections: Vec<_> = result
        .items
        .iter()
        .flat_map(|item| item.corrections.iter().map(move |c| (item.row_number, c)))
        .collect();
    if !corrections.is_empty() {
        println!("\n{}", "Corrections:".cyan().bold());
        for (row_number, correction) in corrections {
            println!(
                "  row {}: {} '{}' -> '{}' ({})",
                row_number,
                correction.field,
                correction.original_value.to_display(),
                correction.corrected_value.to_display(),
                correction.correction_type
            );
        }
    }

    println!("\n{}", "Summary:".bold());
    println!("  Total rows:        {}", summary.total_rows);
    println!("  Valid rows:        {}", summary.valid_rows);
    println!("  Invalid rows:      {}", summary.invalid_rows);
    println!("  Total errors:      {}", summary.total_errors);
    println!("  Total warnings:    {}", summary.total_warnings);
    println!("  Total corrections: {}", summary.total_corrections);
    println!(
        "  Processing time:   {:.3}s",
        summary.processing_time_seconds
    );
    println!("{}", "═".repeat(60));
}

fn print_json_result(result: &ValidationResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}

pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message.green());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message.red());
}

pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}
