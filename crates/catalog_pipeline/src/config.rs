//! Pipeline configuration.

use crate::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where the rules for a validation run come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSource {
    /// Compiled rule engines resolved through the provider registry
    #[default]
    Engine,
    /// Declarative YAML policies interpreted by the policy rule engine
    Policy,
}

impl FromStr for RuleSource {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "engine" => Ok(RuleSource::Engine),
            "policy" => Ok(RuleSource::Policy),
            other => Err(PipelineError::invalid_config(format!(
                "unknown rule source '{}' (expected 'engine' or 'policy')",
                other
            ))),
        }
    }
}

/// How rows are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One row at a time on the calling task
    #[default]
    Sequential,
    /// Rows split into batches; each batch is validated concurrently
    ParallelBatches {
        /// Rows per batch
        batch_size: usize,
    },
}

/// Configuration for a [`ValidationPipeline`](crate::ValidationPipeline).
///
/// # Example
///
/// ```rust
/// use catalog_pipeline::{ExecutionMode, PipelineConfig, RuleSource};
///
/// let config = PipelineConfig::from_yaml_str(r#"
/// rule_source: policy
/// policies_dir: ./policies
/// execution:
///   mode: parallel_batches
///   batch_size: 250
/// "#).unwrap();
///
/// assert_eq!(config.rule_source, RuleSource::Policy);
/// assert_eq!(config.execution, ExecutionMode::ParallelBatches { batch_size: 250 });
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Rule source used by `validate`
    pub rule_source: RuleSource,

    /// Row scheduling
    pub execution: ExecutionMode,

    /// Upper bound on concurrently running blocking validations
    pub max_blocking_tasks: usize,

    /// Root of the policy tree (`{marketplace}/categories/{category}.yml`)
    pub policies_dir: PathBuf,

    /// Directory of YAML rulesets layered on the registered providers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rulesets_dir: Option<PathBuf>,

    /// Category used when a request does not name one
    pub default_category: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            rule_source: RuleSource::default(),
            execution: ExecutionMode::default(),
            max_blocking_tasks: 8,
            policies_dir: PathBuf::from("policies"),
            rulesets_dir: None,
            default_category: "default".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Environment variable selecting the rule source.
    pub const ENV_RULE_SOURCE: &'static str = "CATALOG_RULE_SOURCE";
    /// Environment variable with the policy directory.
    pub const ENV_POLICIES_DIR: &'static str = "CATALOG_POLICIES_DIR";
    /// Environment variable with the ruleset directory.
    pub const ENV_RULESETS_DIR: &'static str = "CATALOG_RULESETS_DIR";
    /// Environment variable enabling batched execution.
    pub const ENV_BATCH_SIZE: &'static str = "CATALOG_BATCH_SIZE";

    /// Creates a new builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        if let ExecutionMode::ParallelBatches { batch_size: 0 } = self.execution {
            return Err(PipelineError::invalid_config("batch_size must be at least 1"));
        }
        if self.max_blocking_tasks == 0 {
            return Err(PipelineError::invalid_config(
                "max_blocking_tasks must be at least 1",
            ));
        }
        if self.default_category.trim().is_empty() {
            return Err(PipelineError::invalid_config(
                "default_category cannot be empty",
            ));
        }
        Ok(())
    }

    /// Parses a YAML configuration.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration file, choosing the format by extension.
    ///
    /// `.yaml` and `.yml` are parsed as YAML, `.toml` as TOML.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path).map_err(|e| PipelineError::io(path, e))?;

        match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content),
            "toml" => Self::from_toml_str(&content),
            other => Err(PipelineError::invalid_config(format!(
                "unsupported configuration format '{}' for {}",
                other,
                path.display()
            ))),
        }
    }

    /// Builds a configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_env_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an environment lookup.
    ///
    /// Unset variables keep their defaults; a positive `CATALOG_BATCH_SIZE`
    /// selects batched execution.
    pub fn from_env_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(source) = lookup(Self::ENV_RULE_SOURCE) {
            config.rule_source = source.parse()?;
        }
        if let Some(dir) = lookup(Self::ENV_POLICIES_DIR) {
            config.policies_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(Self::ENV_RULESETS_DIR) {
            config.rulesets_dir = Some(PathBuf::from(dir));
        }
        if let Some(size) = lookup(Self::ENV_BATCH_SIZE) {
            let batch_size: usize = size.trim().parse().map_err(|_| {
                PipelineError::invalid_config(format!(
                    "{} must be a positive integer, got '{}'",
                    Self::ENV_BATCH_SIZE,
                    size
                ))
            })?;
            config.execution = ExecutionMode::ParallelBatches { batch_size };
        }

        config.validate()?;
        Ok(config)
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Sets the rule source.
    pub fn rule_source(mut self, source: RuleSource) -> Self {
        self.config.rule_source = source;
        self
    }

    /// Validates rows one at a time.
    pub fn sequential(mut self) -> Self {
        self.config.execution = ExecutionMode::Sequential;
        self
    }

    /// Validates rows in concurrent batches of `batch_size`.
    pub fn parallel_batches(mut self, batch_size: usize) -> Self {
        self.config.execution = ExecutionMode::ParallelBatches { batch_size };
        self
    }

    /// Sets the bound on concurrently running blocking validations.
    pub fn max_blocking_tasks(mut self, max: usize) -> Self {
        self.config.max_blocking_tasks = max;
        self
    }

    /// Sets the policy directory.
    pub fn policies_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.policies_dir = dir.into();
        self
    }

    /// Sets the ruleset directory.
    pub fn rulesets_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.rulesets_dir = Some(dir.into());
        self
    }

    /// Sets the default category.
    pub fn default_category(mut self, category: impl Into<String>) -> Self {
        self.config.default_category = category.into();
        self
    }

    /// Builds and validates the configuration.
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.rule_source, RuleSource::Engine);
        assert_eq!(config.execution, ExecutionMode::Sequential);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_config() {
        let config = PipelineConfig::from_toml_str(
            r#"
rule_source = "engine"
rulesets_dir = "rules"
max_blocking_tasks = 4

[execution]
mode = "parallel_batches"
batch_size = 50
"#,
        )
        .unwrap();

        assert_eq!(config.execution, ExecutionMode::ParallelBatches { batch_size: 50 });
        assert_eq!(config.rulesets_dir, Some(PathBuf::from("rules")));
        assert_eq!(config.max_blocking_tasks, 4);
        assert_eq!(config.default_category, "default");
    }

    #[test]
    fn test_env_lookup() {
        let env: HashMap<&str, &str> = [
            ("CATALOG_RULE_SOURCE", "Policy"),
            ("CATALOG_POLICIES_DIR", "/etc/catalog/policies"),
            ("CATALOG_BATCH_SIZE", "100"),
        ]
        .into_iter()
        .collect();

        let config =
            PipelineConfig::from_env_lookup(|key| env.get(key).map(|v| v.to_string())).unwrap();

        assert_eq!(config.rule_source, RuleSource::Policy);
        assert_eq!(config.policies_dir, PathBuf::from("/etc/catalog/policies"));
        assert_eq!(config.execution, ExecutionMode::ParallelBatches { batch_size: 100 });
        assert_eq!(config.rulesets_dir, None);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(PipelineConfig::from_env_lookup(|key| {
            (key == "CATALOG_BATCH_SIZE").then(|| "lots".to_string())
        })
        .is_err());
        assert!(PipelineConfig::from_env_lookup(|key| {
            (key == "CATALOG_RULE_SOURCE").then(|| "magic".to_string())
        })
        .is_err());
        assert!(PipelineConfig::builder().parallel_batches(0).build().is_err());
        assert!(PipelineConfig::builder().max_blocking_tasks(0).build().is_err());
    }

    #[test]
    fn test_config_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("pipeline.yml");
        std::fs::write(&yaml, "rule_source: policy\ndefault_category: books\n").unwrap();
        let config = PipelineConfig::from_file(&yaml).unwrap();
        assert_eq!(config.rule_source, RuleSource::Policy);
        assert_eq!(config.default_category, "books");

        let json = dir.path().join("pipeline.json");
        std::fs::write(&json, "{}").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&json),
            Err(PipelineError::InvalidConfig(_))
        ));
    }
}
