use anyhow::{Context, Result};
use catalog_pipeline::{
    ExecutionMode, PipelineConfig, RuleSource, ValidationPipeline, ValidationRequest,
};
use std::path::Path;
use tracing::info;

use crate::{output, table_io};

/// Options of the `validate` command.
pub struct ValidateArgs {
    pub file: String,
    pub marketplace: String,
    pub category: Option<String>,
    pub auto_fix: bool,
    pub output: Option<String>,
    pub policy: bool,
    pub config: Option<String>,
    pub policies_dir: Option<String>,
    pub rulesets_dir: Option<String>,
    pub batch_size: Option<usize>,
    pub strict: bool,
    pub format: String,
}

pub async fn execute(args: ValidateArgs) -> Result<()> {
    info!("Validating catalog file: {}", args.file);
    info!("Marketplace: {}", args.marketplace);
    info!("Auto-fix: {}", args.auto_fix);

    let config = build_config(&args)?;
    let table = table_io::read_table(Path::new(&args.file))?;

    if args.format != "json" {
        output::print_info(&format!(
            "Loaded {} rows ({} columns) from {}",
            table.len(),
            table.columns().len(),
            args.file
        ));
    }

    let pipeline = ValidationPipeline::new(config).context("Failed to build validation pipeline")?;

    let mut request = ValidationRequest::new(&args.marketplace).auto_fix(args.auto_fix);
    if let Some(category) = &args.category {
        request = request.category(category);
    }

    let result = pipeline
        .validate_request(&table, &request)
        .await
        .with_context(|| format!("Validation failed for marketplace '{}'", args.marketplace))?;

    output::print_validation_result(&result, &args.format)?;

    if let (Some(path), Some(corrected)) = (&args.output, &result.corrected_data) {
        table_io::write_table(Path::new(path), corrected)?;
        if args.format != "json" {
            output::print_success(&format!("Corrected data written to {}", path));
        }
    }

    let passed = result.is_valid() && !(args.strict && result.summary.total_warnings > 0);
    if !passed {
        std::process::exit(1);
    }

    Ok(())
}

/// Layers command-line flags over the file or environment configuration.
fn build_config(args: &ValidateArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration: {}", path))?,
        None => PipelineConfig::from_env().context("Invalid configuration in environment")?,
    };

    if args.policy {
        config.rule_source = RuleSource::Policy;
    }
    if let Some(dir) = &args.policies_dir {
        config.policies_dir = dir.into();
    }
    if let Some(dir) = &args.rulesets_dir {
        config.rulesets_dir = Some(dir.into());
    }
    if let Some(batch_size) = args.batch_size {
        config.execution = ExecutionMode::ParallelBatches { batch_size };
    }

    config.validate()?;
    Ok(config)
}
