//! # Catalog Pipeline
//!
//! Orchestrates catalog validation: resolves the rules serving a marketplace,
//! validates every row (optionally fixing it), isolates rows that fail
//! unexpectedly and aggregates the per-row items into a
//! [`ValidationResult`](catalog_core::ValidationResult).
//!
//! Rules come from one of two sources, chosen by [`PipelineConfig`]:
//!
//! - **Engine**: providers registered in a [`ProviderRegistry`], built into a
//!   rule engine cached per marketplace. An unregistered marketplace is a
//!   configuration error.
//! - **Policy**: YAML policies resolved through a
//!   [`PolicyLoader`](catalog_policy::PolicyLoader), which falls back to a
//!   default policy when none is found.
//!
//! ## Example
//!
//! ```rust
//! use catalog_core::{row_of, Table};
//! use catalog_pipeline::{PipelineConfig, ValidationPipeline, ValidationRequest};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let config = PipelineConfig::builder().parallel_batches(100).build().unwrap();
//! let pipeline = ValidationPipeline::new(config).unwrap();
//!
//! let table = Table::from_rows(vec![row_of([
//!     ("name", "Controle sem fio para videogame"),
//!     ("price", "149,90"),
//!     ("stock", "10"),
//! ])]);
//! let request = ValidationRequest::new("shopee").auto_fix(true).job_id("job-42");
//!
//! let result = pipeline.validate_request(&table, &request).await.unwrap();
//!
//! assert!(result.is_valid());
//! assert_eq!(result.job_id.as_deref(), Some("job-42"));
//! assert_eq!(result.summary.total_corrections, 1);
//! # }
//! ```

mod cache;
mod config;
mod error;
mod pipeline;
mod registry;
mod validator;

pub use cache::EngineCache;
pub use config::{ExecutionMode, PipelineConfig, PipelineConfigBuilder, RuleSource};
pub use error::{PipelineError, Result};
pub use pipeline::{ValidationPipeline, ValidationRequest};
pub use registry::ProviderRegistry;
pub use validator::{
    AsyncRowValidator, EngineRowValidator, PolicyRowValidator, RowReport, RowValidatorHandle,
    SyncRowValidator,
};
