//! Marketplace registry: which providers and validators serve a marketplace.

use crate::validator::RowValidatorHandle;
use crate::{PipelineError, Result};
use catalog_core::normalize_marketplace;
use catalog_policy::RulesetLoader;
use catalog_rules::{
    AmazonProvider, MercadoLivreProvider, RuleEngine, RuleError, RuleProvider, ShopeeProvider,
    YamlRuleProvider,
};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

type ProviderFactory =
    Arc<dyn Fn() -> std::result::Result<Arc<dyn RuleProvider>, RuleError> + Send + Sync>;

/// Provider factories and custom validators, keyed by normalized marketplace.
///
/// Providers are registered as factories so that every engine build (the
/// first use, and each use after a reload) reads fresh configuration.
///
/// # Example
///
/// ```rust
/// use catalog_pipeline::ProviderRegistry;
///
/// let registry = ProviderRegistry::with_defaults();
/// assert!(registry.is_registered("Mercado Livre"));
/// assert!(!registry.is_registered("etsy"));
///
/// let engine = registry.build_engine("shopee").unwrap();
/// assert_eq!(engine.provider_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Vec<ProviderFactory>>,
    validators: HashMap<String, RowValidatorHandle>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("marketplaces", &self.marketplaces())
            .finish()
    }
}

impl ProviderRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in Mercado Livre, Amazon and Shopee
    /// providers.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry
            .register("mercadolivre", MercadoLivreProvider::new)
            .register("amazon", AmazonProvider::new)
            .register("shopee", ShopeeProvider::new);
        registry
    }

    /// Adds a provider for `marketplace`.
    ///
    /// Several providers may serve one marketplace; their rules are merged.
    pub fn register<P, F>(&mut self, marketplace: &str, factory: F) -> &mut Self
    where
        P: RuleProvider + 'static,
        F: Fn() -> std::result::Result<P, RuleError> + Send + Sync + 'static,
    {
        let factory: ProviderFactory =
            Arc::new(move || Ok(Arc::new(factory()?) as Arc<dyn RuleProvider>));
        let key = normalize_marketplace(marketplace);
        debug!("Registering provider for '{}'", key);
        self.providers.entry(key).or_default().push(factory);
        self
    }

    /// Adds the YAML ruleset of `marketplace`, read from `loader` on every build.
    pub fn register_yaml(&mut self, marketplace: &str, loader: RulesetLoader) -> &mut Self {
        let key = normalize_marketplace(marketplace);
        let name = key.clone();
        self.register(&key, move || YamlRuleProvider::load(&loader, &name))
    }

    /// Registers every ruleset found in `loader`'s directory.
    ///
    /// Returns the marketplaces that were registered.
    pub fn register_ruleset_dir(&mut self, loader: &RulesetLoader) -> Vec<String> {
        match loader.available() {
            Ok(marketplaces) => {
                for marketplace in &marketplaces {
                    self.register_yaml(marketplace, loader.clone());
                }
                marketplaces
            }
            Err(e) => {
                warn!("Cannot list rulesets in {}: {}", loader.dir().display(), e);
                Vec::new()
            }
        }
    }

    /// Routes `marketplace` to a custom validator.
    ///
    /// A custom validator takes precedence over registered providers.
    pub fn register_validator(
        &mut self,
        marketplace: &str,
        validator: RowValidatorHandle,
    ) -> &mut Self {
        self.validators
            .insert(normalize_marketplace(marketplace), validator);
        self
    }

    /// Custom validator for `marketplace`, if any.
    pub fn validator_for(&self, marketplace: &str) -> Option<RowValidatorHandle> {
        self.validators
            .get(&normalize_marketplace(marketplace))
            .cloned()
    }

    /// Returns true if a provider or validator serves `marketplace`.
    pub fn is_registered(&self, marketplace: &str) -> bool {
        let key = normalize_marketplace(marketplace);
        self.providers.contains_key(&key) || self.validators.contains_key(&key)
    }

    /// Registered marketplaces, sorted.
    pub fn marketplaces(&self) -> Vec<String> {
        self.providers
            .keys()
            .chain(self.validators.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Builds a fresh engine from the providers of `marketplace`.
    ///
    /// Fails when no provider is registered or a provider cannot be built.
    pub fn build_engine(&self, marketplace: &str) -> Result<RuleEngine> {
        let key = normalize_marketplace(marketplace);
        let factories = self
            .providers
            .get(&key)
            .ok_or_else(|| PipelineError::UnregisteredMarketplace(key.clone()))?;

        let mut engine = RuleEngine::new();
        for factory in factories {
            engine.register_shared_provider(factory()?);
        }
        debug!("Built engine for '{}' with {} providers", key, factories.len());
        Ok(engine)
    }
}
