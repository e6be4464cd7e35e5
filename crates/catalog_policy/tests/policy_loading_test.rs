//! Integration tests for filesystem-backed policy loading.
//!
//! These tests lay out a policies directory the way deployments do and
//! exercise lookup, versioning, listing and cache invalidation end to end.

use catalog_policy::{FieldType, PolicyLoader, Transform};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const ELECTRONICS: &str = r#"
marketplace: mercadolivre
category: electronics
version: "1"
fields:
  title:
    required: true
    max_length: 60
    transform: trim
  price:
    required: true
    type: numeric
    min_value: 0.01
    decimal_places: 2
custom_attributes:
  voltage:
    type: enum
    values: ["110V", "220V", "bivolt"]
    case_insensitive: true
error_codes:
  TITLE_TOO_LONG: "Title is longer than 60 characters"
"#;

const ELECTRONICS_V2: &str = r#"
marketplace: mercadolivre
category: electronics
version: "2"
fields:
  title:
    required: true
    max_length: 80
"#;

fn write(root: &Path, marketplace: &str, file: &str, content: &str) {
    let dir = root.join(marketplace).join("categories");
    fs::create_dir_all(&dir).expect("Failed to create policy directory");
    fs::write(dir.join(file), content).expect("Failed to write policy");
}

#[test]
fn test_loads_policy_from_directory_layout() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mercadolivre", "electronics.yml", ELECTRONICS);

    let loader = PolicyLoader::from_dir(dir.path());
    let policy = loader.get_policy("Mercado Livre", "Electronics", None);

    assert!(!policy.fallback);
    assert_eq!(policy.version.as_deref(), Some("1"));
    assert_eq!(policy.fields["title"].transform, Some(Transform::Trim));
    assert_eq!(policy.fields["price"].field_type, Some(FieldType::Numeric));
    assert!(policy.custom_attributes["voltage"].case_insensitive);
}

#[test]
fn test_versioned_policy_lookup() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mercadolivre", "electronics.yml", ELECTRONICS);
    write(dir.path(), "mercadolivre", "electronics@2.yaml", ELECTRONICS_V2);

    let loader = PolicyLoader::from_dir(dir.path());
    let current = loader.get_policy("mercadolivre", "electronics", None);
    let v2 = loader.get_policy("mercadolivre", "electronics", Some("2"));

    assert_eq!(current.fields["title"].max_length, Some(60));
    assert_eq!(v2.fields["title"].max_length, Some(80));
    assert_eq!(loader.cached_count(), 2);

    let unknown = loader.get_policy("mercadolivre", "electronics", Some("9"));
    assert!(unknown.fallback);
}

#[test]
fn test_edited_file_visible_after_reload() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mercadolivre", "electronics.yml", ELECTRONICS);

    let loader = PolicyLoader::from_dir(dir.path());
    assert_eq!(
        loader.get_policy("mercadolivre", "electronics", None).fields["title"].max_length,
        Some(60)
    );

    write(dir.path(), "mercadolivre", "electronics.yml", ELECTRONICS_V2);
    assert_eq!(
        loader.get_policy("mercadolivre", "electronics", None).fields["title"].max_length,
        Some(60),
        "cached policy is served until reload"
    );

    loader.reload_marketplace("mercadolivre");
    assert_eq!(
        loader.get_policy("mercadolivre", "electronics", None).fields["title"].max_length,
        Some(80)
    );
}

#[test]
fn test_missing_directory_degrades_gracefully() {
    let dir = TempDir::new().unwrap();
    let loader = PolicyLoader::from_dir(dir.path().join("does-not-exist"));

    let policy = loader.get_policy("amazon", "books", None);
    assert!(policy.fallback);
    assert!(loader.list_available_policies(None).is_empty());
}

#[test]
fn test_listing_for_admin_tooling() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mercadolivre", "electronics.yml", ELECTRONICS);
    write(dir.path(), "mercadolivre", "electronics@2.yaml", ELECTRONICS_V2);
    write(dir.path(), "mercadolivre", "celulares.yml", ELECTRONICS);
    write(dir.path(), "shopee", "toys.yml", ELECTRONICS);

    let loader = PolicyLoader::from_dir(dir.path());
    let all = loader.list_available_policies(None);
    assert_eq!(all.len(), 2);
    assert_eq!(all["mercadolivre"], vec!["celulares", "electronics"]);

    let shopee = loader.list_available_policies(Some("shopee"));
    assert_eq!(shopee.keys().collect::<Vec<_>>(), vec!["shopee"]);
}
