//! Per-marketplace cache of built rule engines.

use catalog_core::normalize_marketplace;
use catalog_rules::RuleEngine;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Built engines keyed by normalized marketplace.
///
/// Owned by a pipeline; it lives as long as the pipeline and is only emptied
/// through explicit invalidation. A reader racing an invalidation may still
/// use the engine it already holds.
#[derive(Debug, Default)]
pub struct EngineCache {
    engines: RwLock<HashMap<String, Arc<RuleEngine>>>,
}

impl EngineCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached engine for `marketplace`.
    pub fn get(&self, marketplace: &str) -> Option<Arc<RuleEngine>> {
        self.engines
            .read()
            .get(&normalize_marketplace(marketplace))
            .cloned()
    }

    /// Returns the cached engine, building and caching it on a miss.
    ///
    /// The build runs outside the lock; when two callers race, the first
    /// engine stored wins and both receive it.
    pub fn get_or_try_insert_with<F, E>(
        &self,
        marketplace: &str,
        build: F,
    ) -> Result<Arc<RuleEngine>, E>
    where
        F: FnOnce() -> Result<RuleEngine, E>,
    {
        let key = normalize_marketplace(marketplace);
        if let Some(engine) = self.engines.read().get(&key) {
            debug!("Engine cache hit for '{}'", key);
            return Ok(Arc::clone(engine));
        }

        let engine = Arc::new(build()?);
        debug!("Caching engine for '{}'", key);
        let mut engines = self.engines.write();
        Ok(Arc::clone(engines.entry(key).or_insert(engine)))
    }

    /// Drops the engine for `marketplace`, returning true if one was cached.
    pub fn invalidate(&self, marketplace: &str) -> bool {
        self.engines
            .write()
            .remove(&normalize_marketplace(marketplace))
            .is_some()
    }

    /// Drops every cached engine.
    pub fn clear(&self) {
        self.engines.write().clear();
    }

    /// Returns true if an engine is cached for `marketplace`.
    pub fn contains(&self, marketplace: &str) -> bool {
        self.engines
            .read()
            .contains_key(&normalize_marketplace(marketplace))
    }

    /// Cached marketplaces, sorted.
    pub fn marketplaces(&self) -> Vec<String> {
        let mut names: Vec<String> = self.engines.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of cached engines.
    pub fn len(&self) -> usize {
        self.engines.read().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.engines.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::convert::Infallible;

    #[test]
    fn test_builds_once_then_hits() {
        let cache = EngineCache::new();
        let mut builds = 0;

        for _ in 0..3 {
            cache
                .get_or_try_insert_with("Mercado Livre", || {
                    builds += 1;
                    Ok::<_, Infallible>(RuleEngine::new())
                })
                .unwrap();
        }

        assert_eq!(builds, 1);
        assert!(cache.contains("mercadolivre"));
        assert_eq!(cache.marketplaces(), vec!["mercadolivre"]);
    }

    #[test]
    fn test_failed_build_is_not_cached() {
        let cache = EngineCache::new();
        let result = cache.get_or_try_insert_with("amazon", || Err("boom"));
        assert_eq!(result.unwrap_err(), "boom");
        assert!(cache.is_empty());
    }

    #[test]
    fn test_invalidate_one_marketplace() {
        let cache = EngineCache::new();
        for marketplace in ["amazon", "shopee"] {
            cache
                .get_or_try_insert_with(marketplace, || Ok::<_, Infallible>(RuleEngine::new()))
                .unwrap();
        }

        assert!(cache.invalidate("AMAZON"));
        assert!(!cache.invalidate("amazon"));
        assert_eq!(cache.marketplaces(), vec!["shopee"]);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
