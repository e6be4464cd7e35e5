//! The validation pipeline.

use crate::cache::EngineCache;
use crate::config::{ExecutionMode, PipelineConfig, RuleSource};
use crate::registry::ProviderRegistry;
use crate::validator::{EngineRowValidator, PolicyRowValidator, RowReport, RowValidatorHandle};
use crate::{PipelineError, Result};
use catalog_core::{
    CorrectedTableBuilder, Row, RowError, Table, ValidationItem, ValidationResult,
    ValidationResultBuilder, ValidationScope,
};
use catalog_policy::{PolicyLoader, RulesetLoader};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// A validation request, as received from an outer layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRequest {
    /// Marketplace name or alias
    pub marketplace: String,
    /// Category; the configured default when absent
    #[serde(default)]
    pub category: Option<String>,
    /// Apply fixes and return corrected data
    #[serde(default)]
    pub auto_fix: bool,
    /// Correlation id copied to the result
    #[serde(default)]
    pub job_id: Option<String>,
}

impl ValidationRequest {
    /// Creates a request without auto-fix.
    pub fn new(marketplace: impl Into<String>) -> Self {
        Self {
            marketplace: marketplace.into(),
            category: None,
            auto_fix: false,
            job_id: None,
        }
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Enables or disables auto-fix.
    pub fn auto_fix(mut self, auto_fix: bool) -> Self {
        self.auto_fix = auto_fix;
        self
    }

    /// Sets the correlation id.
    pub fn job_id(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }
}

/// Validates catalog tables against marketplace rules.
///
/// The pipeline never mutates its input. Every row yields exactly one item;
/// a row whose validation fails unexpectedly (including a panicking rule)
/// yields a single `VALIDATION_ERROR` item and the remaining rows are still
/// processed. Only configuration problems are returned as errors.
///
/// # Example
///
/// ```rust
/// use catalog_core::{row_of, Table};
/// use catalog_pipeline::{PipelineConfig, ValidationPipeline};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let pipeline = ValidationPipeline::new(PipelineConfig::default()).unwrap();
///
/// let table = Table::from_rows(vec![row_of([
///     ("title", ""),
///     ("price", "10.99"),
///     ("stock", "5"),
/// ])]);
///
/// let result = pipeline
///     .validate(&table, "mercadolivre", "toys", false)
///     .await
///     .unwrap();
///
/// assert_eq!(result.summary.invalid_rows, 1);
/// assert_eq!(result.items[0].errors[0].field, "title");
/// # }
/// ```
#[derive(Debug)]
pub struct ValidationPipeline {
    config: PipelineConfig,
    registry: ProviderRegistry,
    engines: EngineCache,
    policies: Option<PolicyLoader>,
    limiter: Arc<Semaphore>,
}

impl ValidationPipeline {
    /// Creates a pipeline with the built-in providers.
    ///
    /// Rulesets found in `rulesets_dir` are layered on the built-in
    /// providers; a policy loader is created for the policy rule source.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let mut registry = ProviderRegistry::with_defaults();
        if let Some(dir) = &config.rulesets_dir {
            let registered = registry.register_ruleset_dir(&RulesetLoader::new(dir));
            info!("Registered {} rulesets from {}", registered.len(), dir.display());
        }
        let policies = match config.rule_source {
            RuleSource::Policy => Some(PolicyLoader::from_dir(&config.policies_dir)),
            RuleSource::Engine => None,
        };
        Self::with_parts(config, registry, policies)
    }

    /// Creates a pipeline from explicit parts.
    pub fn with_parts(
        config: PipelineConfig,
        registry: ProviderRegistry,
        policies: Option<PolicyLoader>,
    ) -> Result<Self> {
        config.validate()?;
        if config.rule_source == RuleSource::Policy && policies.is_none() {
            return Err(PipelineError::invalid_config(
                "the policy rule source requires a policy loader",
            ));
        }
        Ok(Self {
            limiter: Arc::new(Semaphore::new(config.max_blocking_tasks)),
            config,
            registry,
            engines: EngineCache::new(),
            policies,
        })
    }

    /// The configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The provider registry.
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// The engine cache.
    pub fn engines(&self) -> &EngineCache {
        &self.engines
    }

    /// The policy loader, when the pipeline has one.
    pub fn policies(&self) -> Option<&PolicyLoader> {
        self.policies.as_ref()
    }

    /// Validates a table.
    ///
    /// With `auto_fix`, fixes are applied to a copy of the table, returned
    /// as `corrected_data` alongside the original findings.
    pub async fn validate(
        &self,
        table: &Table,
        marketplace: &str,
        category: &str,
        auto_fix: bool,
    ) -> Result<ValidationResult> {
        self.run(table, marketplace, category, auto_fix, None).await
    }

    /// Validates a table described by a request.
    pub async fn validate_request(
        &self,
        table: &Table,
        request: &ValidationRequest,
    ) -> Result<ValidationResult> {
        let category = request
            .category
            .as_deref()
            .unwrap_or(&self.config.default_category);
        self.run(
            table,
            &request.marketplace,
            category,
            request.auto_fix,
            request.job_id.clone(),
        )
        .await
    }

    /// Validates one row.
    ///
    /// Returns the row (corrected when `auto_fix` is set) and its item.
    pub async fn validate_single_row(
        &self,
        row: &Row,
        marketplace: &str,
        category: Option<&str>,
        row_number: usize,
        auto_fix: bool,
    ) -> Result<(Row, Vec<ValidationItem>)> {
        let category = category.unwrap_or(&self.config.default_category);
        let scope = ValidationScope::new(marketplace, category);
        let validator = self.resolve(&scope)?;

        let (row, item) = match validator.run(row, row_number, &scope, auto_fix).await {
            Ok(RowReport { item, row }) => (row, item),
            Err(e) => (row.clone(), isolate(e)),
        };
        Ok((row, vec![item]))
    }

    /// Invalidates cached rules for one marketplace, or for all when `None`.
    pub fn reload_rules(&self, marketplace: Option<&str>) {
        match marketplace {
            Some(marketplace) => self.reload_marketplace_rules(marketplace),
            None => self.clear_cache(),
        }
    }

    /// Invalidates cached rules for one marketplace.
    ///
    /// Other marketplaces keep their cached engines and policies.
    pub fn reload_marketplace_rules(&self, marketplace: &str) {
        let dropped = self.engines.invalidate(marketplace);
        if let Some(policies) = &self.policies {
            policies.reload_marketplace(marketplace);
        }
        info!(
            "Reloaded rules for '{}' (cached engine dropped: {})",
            marketplace, dropped
        );
    }

    /// Invalidates every cached engine and policy.
    pub fn clear_cache(&self) {
        self.engines.clear();
        if let Some(policies) = &self.policies {
            policies.reload_policies();
        }
        info!("Cleared rule caches");
    }

    async fn run(
        &self,
        table: &Table,
        marketplace: &str,
        category: &str,
        auto_fix: bool,
        job_id: Option<String>,
    ) -> Result<ValidationResult> {
        let started = Instant::now();
        let scope = Arc::new(ValidationScope::new(marketplace, category));
        let result = ValidationResultBuilder::new(scope.marketplace.clone(), category)
            .maybe_job_id(job_id);

        if table.is_empty() {
            warn!("Rejecting empty input for '{}'", scope.marketplace);
            return Ok(result
                .item(ValidationItem::malformed_input("Input contains no data rows"))
                .build(0, started.elapsed()));
        }

        let validator = self.resolve(&scope)?;
        info!(
            "Validating {} rows for {}/{} (auto_fix: {})",
            table.len(),
            scope.marketplace,
            scope.category,
            auto_fix
        );

        let items = match self.config.execution {
            ExecutionMode::Sequential => {
                let mut items = Vec::with_capacity(table.len());
                for (idx, row) in table.rows().enumerate() {
                    items.push(into_item(validator.run(row, idx + 1, &scope, auto_fix).await));
                }
                items
            }
            ExecutionMode::ParallelBatches { batch_size } => {
                let rows: Vec<&Row> = table.rows().collect();
                let mut items = Vec::with_capacity(rows.len());
                for (batch_idx, batch) in rows.chunks(batch_size).enumerate() {
                    let offset = batch_idx * batch_size;
                    let tasks = batch.iter().enumerate().map(|(idx, row)| {
                        validator.dispatch(
                            (*row).clone(),
                            offset + idx + 1,
                            Arc::clone(&scope),
                            auto_fix,
                            Arc::clone(&self.limiter),
                        )
                    });
                    items.extend(join_all(tasks).await.into_iter().map(into_item));
                    debug!("Finished batch {} ({} rows)", batch_idx + 1, batch.len());
                }
                items
            }
        };

        let result = if auto_fix {
            let mut corrected = CorrectedTableBuilder::new(table);
            for item in &items {
                corrected.record_item(item);
            }
            debug!("Auto-fix changed {} cells", corrected.changed_cells());
            result.corrected_data(corrected.build())
        } else {
            result
        };

        let result = result.items(items).build(table.len(), started.elapsed());
        info!(
            "Validated {} rows for {}: {} valid, {} invalid, {} errors, {} warnings, {} corrections",
            result.summary.total_rows,
            result.marketplace,
            result.summary.valid_rows,
            result.summary.invalid_rows,
            result.summary.total_errors,
            result.summary.total_warnings,
            result.summary.total_corrections
        );
        Ok(result)
    }

    /// Picks the validator serving `scope`.
    ///
    /// Custom validators win; otherwise the configured rule source decides.
    /// The engine source fails on an unregistered marketplace, while the
    /// policy source falls back to the default policy.
    fn resolve(&self, scope: &ValidationScope) -> Result<RowValidatorHandle> {
        if let Some(validator) = self.registry.validator_for(&scope.marketplace) {
            return Ok(validator);
        }

        match self.config.rule_source {
            RuleSource::Engine => {
                let engine = self
                    .engines
                    .get_or_try_insert_with(&scope.marketplace, || {
                        self.registry.build_engine(&scope.marketplace)
                    })?;
                Ok(RowValidatorHandle::from_sync(EngineRowValidator::new(
                    engine.compile(scope),
                )))
            }
            RuleSource::Policy => {
                let policies = self.policies.as_ref().ok_or_else(|| {
                    PipelineError::invalid_config("the policy rule source requires a policy loader")
                })?;
                let policy = policies.get_policy(&scope.marketplace, &scope.category, None);
                Ok(RowValidatorHandle::from_sync(PolicyRowValidator::new(policy)?))
            }
        }
    }
}

fn isolate(error: RowError) -> ValidationItem {
    warn!("{}", error);
    ValidationItem::row_failure(error.row_number, error.message)
}

fn into_item(outcome: std::result::Result<RowReport, RowError>) -> ValidationItem {
    match outcome {
        Ok(report) => report.item,
        Err(e) => isolate(e),
    }
}
