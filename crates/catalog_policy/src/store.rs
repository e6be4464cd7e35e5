//! Backing stores for policy documents.

use crate::ruleset::has_yaml_extension;
use crate::{PolicyError, Result, normalize_category};
use catalog_core::normalize_marketplace;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Identifies one policy document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolicyKey {
    /// Normalized marketplace identifier
    pub marketplace: String,
    /// Normalized category identifier
    pub category: String,
    /// Optional version label
    pub version: Option<String>,
}

impl PolicyKey {
    /// Creates a key, normalizing marketplace and category.
    pub fn new(marketplace: &str, category: &str, version: Option<&str>) -> Self {
        Self {
            marketplace: normalize_marketplace(marketplace),
            category: normalize_category(category),
            version: version.map(str::to_string),
        }
    }
}

/// Source of raw policy documents.
///
/// Implementations abstract the filesystem, object storage or a database.
pub trait PolicyStore: Send + Sync {
    /// Reads the raw YAML document for `key`.
    fn read(&self, key: &PolicyKey) -> Result<String>;

    /// Lists available categories per marketplace.
    fn list(&self) -> Result<BTreeMap<String, Vec<String>>>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Filesystem store using `{root}/{marketplace}/categories/{category}.yml`.
///
/// Versioned documents are named `{category}@{version}.yml`; `.yaml` is
/// accepted as well.
#[derive(Debug, Clone)]
pub struct FsPolicyStore {
    root: PathBuf,
}

impl FsPolicyStore {
    /// Creates a store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn categories_dir(&self, marketplace: &str) -> PathBuf {
        self.root.join(marketplace).join("categories")
    }

    /// Candidate paths for `key`, in lookup order.
    pub fn candidate_paths(&self, key: &PolicyKey) -> Vec<PathBuf> {
        let stem = match &key.version {
            Some(version) => format!("{}@{}", key.category, version),
            None => key.category.clone(),
        };
        let dir = self.categories_dir(&key.marketplace);
        ["yml", "yaml"]
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .collect()
    }
}

impl PolicyStore for FsPolicyStore {
    fn read(&self, key: &PolicyKey) -> Result<String> {
        let path = self
            .candidate_paths(key)
            .into_iter()
            .find(|p| p.is_file())
            .ok_or_else(|| {
                PolicyError::NotFound(format!(
                    "policy {}/{} in {}",
                    key.marketplace,
                    key.category,
                    self.root.display()
                ))
            })?;
        std::fs::read_to_string(&path).map_err(|e| PolicyError::io(&path, e))
    }

    fn list(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut listing = BTreeMap::new();
        let entries = std::fs::read_dir(&self.root).map_err(|e| PolicyError::io(&self.root, e))?;

        for entry in entries.filter_map(|e| e.ok()) {
            if !entry.path().is_dir() {
                continue;
            }
            let Some(marketplace) = entry.file_name().to_str().map(String::from) else {
                continue;
            };
            let Ok(files) = std::fs::read_dir(self.categories_dir(&marketplace)) else {
                continue;
            };

            let categories: BTreeSet<String> = files
                .filter_map(|f| f.ok())
                .map(|f| f.path())
                .filter(|p| has_yaml_extension(p))
                .filter_map(|p| p.file_stem()?.to_str().map(String::from))
                .map(|stem| match stem.split_once('@') {
                    Some((category, _)) => category.to_string(),
                    None => stem,
                })
                .collect();

            if !categories.is_empty() {
                listing.insert(marketplace, categories.into_iter().collect());
            }
        }

        Ok(listing)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// In-memory store, for tests and for documents fetched by other means.
#[derive(Debug, Default)]
pub struct MemoryPolicyStore {
    documents: RwLock<BTreeMap<PolicyKey, String>>,
}

impl MemoryPolicyStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a document.
    pub fn insert(
        &self,
        marketplace: &str,
        category: &str,
        version: Option<&str>,
        yaml: impl Into<String>,
    ) {
        self.documents
            .write()
            .insert(PolicyKey::new(marketplace, category, version), yaml.into());
    }

    /// Removes a document.
    pub fn remove(&self, marketplace: &str, category: &str, version: Option<&str>) {
        self.documents
            .write()
            .remove(&PolicyKey::new(marketplace, category, version));
    }
}

impl PolicyStore for MemoryPolicyStore {
    fn read(&self, key: &PolicyKey) -> Result<String> {
        self.documents.read().get(key).cloned().ok_or_else(|| {
            PolicyError::NotFound(format!("policy {}/{} in memory", key.marketplace, key.category))
        })
    }

    fn list(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut listing: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for key in self.documents.read().keys() {
            let categories = listing.entry(key.marketplace.clone()).or_default();
            if !categories.contains(&key.category) {
                categories.push(key.category.clone());
            }
        }
        Ok(listing)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
