//! Cached policy resolution.

use crate::store::{FsPolicyStore, PolicyKey, PolicyStore};
use crate::{Policy, Result, ensure_valid_structure, parse_policy_yaml};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Resolves `(marketplace, category)` to a [`Policy`].
///
/// Policies read from the store are cached until [`reload_policies`] or
/// [`reload_marketplace`] is called. A document that is missing, unparsable or
/// structurally invalid yields the synthetic default policy instead of an
/// error; those fallbacks are not cached, so a newly authored file is picked
/// up on the next lookup.
///
/// [`reload_policies`]: PolicyLoader::reload_policies
/// [`reload_marketplace`]: PolicyLoader::reload_marketplace
///
/// # Example
///
/// ```rust
/// use catalog_policy::{MemoryPolicyStore, PolicyLoader};
/// use std::sync::Arc;
///
/// let store = Arc::new(MemoryPolicyStore::new());
/// let loader = PolicyLoader::new(store.clone());
///
/// let policy = loader.get_policy("amazon", "books", None);
/// assert!(policy.fallback);
///
/// store.insert("amazon", "books", None, "marketplace: amazon\ncategory: books\nfields:\n  isbn:\n    required: true\n");
/// let policy = loader.get_policy("amazon", "books", None);
/// assert!(!policy.fallback);
/// assert!(policy.fields.contains_key("isbn"));
/// ```
pub struct PolicyLoader {
    store: Arc<dyn PolicyStore>,
    cache: RwLock<HashMap<PolicyKey, Arc<Policy>>>,
}

impl std::fmt::Debug for PolicyLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyLoader")
            .field("store", &self.store.describe())
            .field("cached", &self.cached_count())
            .finish()
    }
}

impl PolicyLoader {
    /// Creates a loader over the given store.
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self {
            store,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Creates a loader over `{dir}/{marketplace}/categories/{category}.yml`.
    pub fn from_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FsPolicyStore::new(dir)))
    }

    /// Returns the policy for a marketplace and category, or the default policy.
    pub fn get_policy(
        &self,
        marketplace: &str,
        category: &str,
        version: Option<&str>,
    ) -> Arc<Policy> {
        match self.try_get_policy(marketplace, category, version) {
            Ok(policy) => policy,
            Err(e) => {
                warn!(
                    "Using default policy for {}/{}: {}",
                    marketplace, category, e
                );
                Arc::new(Policy::default_policy(marketplace, category))
            }
        }
    }

    /// Returns the policy for a marketplace and category without falling back.
    pub fn try_get_policy(
        &self,
        marketplace: &str,
        category: &str,
        version: Option<&str>,
    ) -> Result<Arc<Policy>> {
        let key = PolicyKey::new(marketplace, category, version);

        if let Some(policy) = self.cache.read().get(&key) {
            debug!("Policy cache hit for {}/{}", key.marketplace, key.category);
            return Ok(Arc::clone(policy));
        }

        let content = self.store.read(&key)?;
        let mut policy = parse_policy_yaml(&content)?;
        if policy.marketplace.is_empty() {
            policy.marketplace = key.marketplace.clone();
        }
        if policy.category.is_empty() {
            policy.category = key.category.clone();
        }
        if policy.version.is_none() {
            policy.version = key.version.clone();
        }
        ensure_valid_structure(&policy)?;

        info!(
            "Loaded policy {}/{} from {} ({} fields)",
            key.marketplace,
            key.category,
            self.store.describe(),
            policy.fields.len()
        );

        let policy = Arc::new(policy);
        self.cache.write().insert(key, Arc::clone(&policy));
        Ok(policy)
    }

    /// Clears every cached policy.
    pub fn reload_policies(&self) {
        let mut cache = self.cache.write();
        info!("Clearing {} cached policies", cache.len());
        cache.clear();
    }

    /// Clears the cached policies of one marketplace.
    pub fn reload_marketplace(&self, marketplace: &str) {
        let marketplace = catalog_core::normalize_marketplace(marketplace);
        let mut cache = self.cache.write();
        let before = cache.len();
        cache.retain(|key, _| key.marketplace != marketplace);
        info!(
            "Cleared {} cached policies for '{}'",
            before - cache.len(),
            marketplace
        );
    }

    /// Number of cached policies.
    pub fn cached_count(&self) -> usize {
        self.cache.read().len()
    }

    /// Lists available categories, per marketplace.
    ///
    /// Returns an empty listing when the store cannot be enumerated.
    pub fn list_available_policies(
        &self,
        marketplace: Option<&str>,
    ) -> BTreeMap<String, Vec<String>> {
        let mut listing = match self.store.list() {
            Ok(listing) => listing,
            Err(e) => {
                warn!("Cannot list policies in {}: {}", self.store.describe(), e);
                return BTreeMap::new();
            }
        };

        if let Some(marketplace) = marketplace {
            let marketplace = catalog_core::normalize_marketplace(marketplace);
            listing.retain(|m, _| *m == marketplace);
        }
        listing
    }

    /// Structural self-check of a policy.
    pub fn validate_policy_structure(&self, policy: &Policy) -> (bool, Vec<String>) {
        crate::validate_policy_structure(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryPolicyStore, PolicyError};
    use pretty_assertions::assert_eq;

    const BOOKS: &str = r#"
marketplace: amazon
category: books
fields:
  isbn:
    required: true
    pattern: "^[0-9]{13}$"
"#;

    fn loader_with(docs: &[(&str, &str, &str)]) -> (Arc<MemoryPolicyStore>, PolicyLoader) {
        let store = Arc::new(MemoryPolicyStore::new());
        for (marketplace, category, yaml) in docs {
            store.insert(marketplace, category, None, *yaml);
        }
        let loader = PolicyLoader::new(store.clone());
        (store, loader)
    }

    #[test]
    fn test_cache_hit_returns_same_policy() {
        let (_, loader) = loader_with(&[("amazon", "books", BOOKS)]);

        let first = loader.get_policy("amazon", "books", None);
        let second = loader.get_policy("Amazon", "Books", None);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached_count(), 1);
    }

    #[test]
    fn test_missing_policy_falls_back_without_caching() {
        let (_, loader) = loader_with(&[]);

        let policy = loader.get_policy("shopee", "toys", None);
        assert!(policy.fallback);
        assert_eq!(policy.marketplace, "shopee");
        assert_eq!(loader.cached_count(), 0);
        assert!(loader.try_get_policy("shopee", "toys", None).is_err());
    }

    #[test]
    fn test_malformed_and_invalid_policies_fall_back() {
        let (_, loader) = loader_with(&[
            ("amazon", "books", "fields: [unclosed"),
            (
                "amazon",
                "toys",
                "fields:\n  title:\n    min_length: 9\n    max_length: 1\n",
            ),
        ]);

        assert!(loader.get_policy("amazon", "books", None).fallback);
        assert!(matches!(
            loader.try_get_policy("amazon", "toys", None),
            Err(PolicyError::InvalidStructure(_))
        ));
        assert!(loader.get_policy("amazon", "toys", None).fallback);
    }

    #[test]
    fn test_reload_marketplace_keeps_others() {
        let (store, loader) = loader_with(&[
            ("amazon", "books", BOOKS),
            ("shopee", "toys", "fields:\n  name:\n    required: true\n"),
        ]);
        loader.get_policy("amazon", "books", None);
        let shopee = loader.get_policy("shopee", "toys", None);
        assert_eq!(loader.cached_count(), 2);

        store.insert(
            "amazon",
            "books",
            None,
            "fields:\n  isbn:\n    required: true\n  author:\n    required: true\n",
        );
        assert_eq!(loader.get_policy("amazon", "books", None).fields.len(), 1);

        loader.reload_marketplace("amazon");
        assert_eq!(loader.cached_count(), 1);
        assert_eq!(loader.get_policy("amazon", "books", None).fields.len(), 2);
        assert!(Arc::ptr_eq(&shopee, &loader.get_policy("shopee", "toys", None)));

        loader.reload_policies();
        assert_eq!(loader.cached_count(), 0);
    }

    #[test]
    fn test_missing_keys_filled_from_lookup() {
        let (_, loader) =
            loader_with(&[("shopee", "toys", "fields:\n  name:\n    required: true\n")]);

        let policy = loader.get_policy("shopee", "toys", None);
        assert!(!policy.fallback);
        assert_eq!(policy.marketplace, "shopee");
        assert_eq!(policy.category, "toys");
    }

    #[test]
    fn test_list_filtered_by_marketplace() {
        let (_, loader) = loader_with(&[
            ("amazon", "books", BOOKS),
            ("shopee", "toys", BOOKS),
        ]);

        assert_eq!(loader.list_available_policies(None).len(), 2);
        let amazon = loader.list_available_policies(Some("Amazon"));
        assert_eq!(amazon.len(), 1);
        assert_eq!(amazon["amazon"], vec!["books"]);
    }
}
