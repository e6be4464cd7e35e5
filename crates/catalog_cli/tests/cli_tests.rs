use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper to get the path to test fixtures
fn fixture_path(name: &str) -> String {
    format!("tests/fixtures/{}", name)
}

/// Helper to create a Command for the catalogv binary
#[allow(deprecated)]
fn catalogv() -> Command {
    let mut cmd = Command::cargo_bin("catalogv").expect("Failed to find catalogv binary");
    for var in [
        "CATALOG_RULE_SOURCE",
        "CATALOG_POLICIES_DIR",
        "CATALOG_RULESETS_DIR",
        "CATALOG_BATCH_SIZE",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// validate command tests
// ============================================================================

#[test]
fn test_validate_valid_listings() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .args(["--marketplace", "mercadolivre"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Loaded 2 rows"))
        .stdout(predicate::str::contains("Validation PASSED"))
        .stdout(predicate::str::contains("Valid rows:        2"));
}

#[test]
fn test_validate_invalid_listings_fails() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("listings.csv"))
        .args(["-m", "mercadolivre"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Validation FAILED"))
        .stdout(predicate::str::contains("row 2: [REQUIRED_FIELD] title"))
        .stdout(predicate::str::contains("Invalid rows:      2"));
}

#[test]
fn test_validate_json_output() {
    let output = catalogv()
        .arg("validate")
        .arg(fixture_path("listings.csv"))
        .args(["-m", "mercadolivre", "--format", "json"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["marketplace"], "mercadolivre");
    assert_eq!(report["category"], "default");
    assert_eq!(report["summary"]["total_rows"], 3);
    assert_eq!(report["summary"]["valid_rows"], 1);
    assert_eq!(report["items"].as_array().unwrap().len(), 3);
    assert!(report["corrected_data"].is_null());
}

#[test]
fn test_validate_auto_fix_writes_corrected_csv() {
    let temp_dir = TempDir::new().unwrap();
    let corrected = temp_dir.path().join("corrected.csv");

    catalogv()
        .arg("validate")
        .arg(fixture_path("fixable_listings.csv"))
        .args(["-m", "mercadolivre", "--output"])
        .arg(&corrected)
        .assert()
        .success()
        .stdout(predicate::str::contains("Corrections:"))
        .stdout(predicate::str::contains("Corrected data written to"));

    let content = fs::read_to_string(&corrected).unwrap();
    let mut lines = content.lines();
    assert_eq!(lines.next(), Some("title,price,stock,condition,brand"));
    assert_eq!(lines.next(), Some("Notebook Gamer 16GB RAM,1999.90,5,new,Acer"));
    assert_eq!(lines.next(), Some("Mouse sem fio,49.9,30,used,Logitech"));
}

#[test]
fn test_validate_parallel_batches_match_sequential() {
    let run = |extra: &[&str]| {
        let output = catalogv()
            .arg("validate")
            .arg(fixture_path("listings.csv"))
            .args(["-m", "mercadolivre", "-f", "json", "--auto-fix"])
            .args(extra)
            .output()
            .unwrap();
        let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
        (report["items"].clone(), report["corrected_data"].clone())
    };

    assert_eq!(run(&[]), run(&["--batch-size", "2"]));
}

#[test]
fn test_validate_unknown_marketplace() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .args(["-m", "etsy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No rule provider registered"));
}

#[test]
fn test_validate_header_only_file_is_malformed() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("header_only.csv"))
        .args(["-m", "amazon"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("MALFORMED_INPUT"));
}

#[test]
fn test_validate_empty_file() {
    let temp_dir = TempDir::new().unwrap();
    let empty = temp_dir.path().join("empty.csv");
    fs::write(&empty, "").unwrap();

    catalogv()
        .arg("validate")
        .arg(&empty)
        .args(["-m", "amazon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no header row"));
}

#[test]
fn test_validate_missing_file() {
    catalogv()
        .arg("validate")
        .arg("nonexistent.csv")
        .args(["-m", "amazon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to open CSV file"));
}

#[test]
fn test_validate_with_policies() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .args(["-m", "mercadolivre", "-c", "electronics", "--policy"])
        .args(["--policies-dir", fixture_path("policies").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Category:    electronics"));
}

#[test]
fn test_validate_strict_fails_on_warnings() {
    let base = || {
        let mut cmd = catalogv();
        cmd.arg("validate")
            .arg(fixture_path("valid_listings.csv"))
            .args(["-m", "mercadolivre", "-c", "books", "--policy"])
            .args(["--policies-dir", fixture_path("policies").as_str()]);
        cmd
    };

    base()
        .assert()
        .success()
        .stdout(predicate::str::contains("DESCRIPTION_MISSING"));

    base().arg("--strict").assert().failure().code(1);
}

#[test]
fn test_validate_with_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = temp_dir.path().join("pipeline.toml");
    fs::write(
        &config,
        format!(
            "rule_source = \"policy\"\npolicies_dir = \"{}\"\n\n[execution]\nmode = \"parallel_batches\"\nbatch_size = 1\n",
            fixture_path("policies")
        ),
    )
    .unwrap();

    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .args(["-m", "mercadolivre", "-c", "electronics", "--config"])
        .arg(&config)
        .assert()
        .success();
}

#[test]
fn test_validate_rejects_zero_batch_size() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .args(["-m", "amazon", "--batch-size", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("batch_size must be at least 1"));
}

// ============================================================================
// check command tests
// ============================================================================

#[test]
fn test_check_valid_policy() {
    catalogv()
        .arg("check")
        .arg(fixture_path("valid_policy.yml"))
        .assert()
        .success()
        .stdout(predicate::str::contains("mercadolivre/electronics"))
        .stdout(predicate::str::contains("2024.1"))
        .stdout(predicate::str::contains("title (required)"))
        .stdout(predicate::str::contains("Policy structure is valid"));
}

#[test]
fn test_check_valid_policy_json() {
    let output = catalogv()
        .arg("check")
        .arg(fixture_path("valid_policy.yml"))
        .args(["--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["valid"], true);
    assert_eq!(
        report["fields"],
        serde_json::json!(["condition", "price", "title"])
    );
}

#[test]
fn test_check_invalid_policy() {
    catalogv()
        .arg("check")
        .arg(fixture_path("invalid_policy.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required key 'category'"))
        .stderr(predicate::str::contains("min_length (80) is greater than max_length (60)"))
        .stderr(predicate::str::contains("invalid pattern"));
}

#[test]
fn test_check_missing_file() {
    catalogv()
        .arg("check")
        .arg("nonexistent.yml")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error"));
}

// ============================================================================
// policies command tests
// ============================================================================

#[test]
fn test_policies_list() {
    catalogv()
        .args(["policies", "list", "--dir", fixture_path("policies").as_str()])
        .assert()
        .success()
        .stdout(predicate::str::contains("mercadolivre (2 categories)"))
        .stdout(predicate::str::contains("- books"))
        .stdout(predicate::str::contains("- electronics"));
}

#[test]
fn test_policies_list_json_filtered() {
    let output = catalogv()
        .args(["policies", "list", "--dir", fixture_path("policies").as_str()])
        .args(["--marketplace", "amazon", "--format", "json"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let listing: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(listing, serde_json::json!({}));
}

#[test]
fn test_policies_list_missing_dir() {
    let temp_dir = TempDir::new().unwrap();

    catalogv()
        .args(["policies", "list", "--dir"])
        .arg(temp_dir.path().join("missing"))
        .assert()
        .success()
        .stdout(predicate::str::contains("No policies found"));
}

// ============================================================================
// General CLI tests
// ============================================================================

#[test]
fn test_help() {
    catalogv()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Catalog Rules Engine CLI"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("policies"));
}

#[test]
fn test_version() {
    catalogv()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("catalogv"));
}

#[test]
fn test_validate_requires_marketplace() {
    catalogv()
        .arg("validate")
        .arg(fixture_path("valid_listings.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("--marketplace"));
}
