//! Row validators: the unit of work the pipeline schedules.
//!
//! A validator is either synchronous or asynchronous. [`RowValidatorHandle`]
//! hides the difference: the pipeline always awaits one call, and sync
//! validators are moved onto the blocking pool when rows run concurrently.

use async_trait::async_trait;
use catalog_core::{ErrorDetail, Row, RowError, ValidationItem, ValidationScope};
use catalog_policy::Policy;
use catalog_rules::{PolicyRuleEngine, RuleSet, validate_and_fix_row, validate_row};
use futures::FutureExt;
use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Report for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowReport {
    /// Findings and corrections
    pub item: ValidationItem,
    /// The row after corrections; equal to the input when nothing was fixed
    pub row: Row,
}

/// A validator that runs to completion on the calling thread.
pub trait SyncRowValidator: Send + Sync {
    /// Validates one row, applying fixes when `auto_fix` is set.
    fn validate_row(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
        auto_fix: bool,
    ) -> Result<RowReport, RowError>;
}

/// A validator that awaits external work (lookups, remote checks).
#[async_trait]
pub trait AsyncRowValidator: Send + Sync {
    /// Validates one row, applying fixes when `auto_fix` is set.
    async fn validate_row(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
        auto_fix: bool,
    ) -> Result<RowReport, RowError>;
}

/// A sync or async validator behind one async call.
#[derive(Clone)]
pub enum RowValidatorHandle {
    /// Synchronous validator
    Sync(Arc<dyn SyncRowValidator>),
    /// Asynchronous validator
    Async(Arc<dyn AsyncRowValidator>),
}

impl std::fmt::Debug for RowValidatorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowValidatorHandle::Sync(_) => f.write_str("RowValidatorHandle::Sync"),
            RowValidatorHandle::Async(_) => f.write_str("RowValidatorHandle::Async"),
        }
    }
}

impl RowValidatorHandle {
    /// Wraps a synchronous validator.
    pub fn from_sync(validator: impl SyncRowValidator + 'static) -> Self {
        RowValidatorHandle::Sync(Arc::new(validator))
    }

    /// Wraps an asynchronous validator.
    pub fn from_async(validator: impl AsyncRowValidator + 'static) -> Self {
        RowValidatorHandle::Async(Arc::new(validator))
    }

    /// Validates a row on the current task.
    ///
    /// A panic inside the validator is caught and returned as a [`RowError`].
    pub async fn run(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
        auto_fix: bool,
    ) -> Result<RowReport, RowError> {
        match self {
            RowValidatorHandle::Sync(validator) => {
                catch_unwind(AssertUnwindSafe(|| {
                    validator.validate_row(row, row_number, scope, auto_fix)
                }))
                .unwrap_or_else(|panic| Err(RowError::new(row_number, panic_message(panic))))
            }
            RowValidatorHandle::Async(validator) => {
                AssertUnwindSafe(validator.validate_row(row, row_number, scope, auto_fix))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(RowError::new(row_number, panic_message(panic))))
            }
        }
    }

    /// Validates a row, moving sync work onto the blocking pool.
    ///
    /// At most as many sync validations as `limiter` has permits run at once.
    pub async fn dispatch(
        &self,
        row: Row,
        row_number: usize,
        scope: Arc<ValidationScope>,
        auto_fix: bool,
        limiter: Arc<Semaphore>,
    ) -> Result<RowReport, RowError> {
        let validator = match self {
            RowValidatorHandle::Sync(validator) => Arc::clone(validator),
            RowValidatorHandle::Async(_) => {
                return self.run(&row, row_number, &scope, auto_fix).await;
            }
        };

        let permit = limiter
            .acquire_owned()
            .await
            .map_err(|e| RowError::new(row_number, e.to_string()))?;
        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            validator.validate_row(&row, row_number, &scope, auto_fix)
        });

        match task.await {
            Ok(result) => result,
            Err(e) if e.is_panic() => Err(RowError::new(row_number, panic_message(e.into_panic()))),
            Err(e) => Err(RowError::new(row_number, e.to_string())),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "rule panicked".to_string()
    }
}

/// Runs a compiled rule set.
#[derive(Debug, Clone)]
pub struct EngineRowValidator {
    rules: Arc<RuleSet>,
}

impl EngineRowValidator {
    /// Creates a validator over rules compiled for one scope.
    pub fn new(rules: RuleSet) -> Self {
        Self {
            rules: Arc::new(rules),
        }
    }

    /// The compiled rules.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }
}

impl SyncRowValidator for EngineRowValidator {
    fn validate_row(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
        auto_fix: bool,
    ) -> Result<RowReport, RowError> {
        if !auto_fix {
            let errors = validate_row(row, row_number, &self.rules, scope)
                .into_iter()
                .map(ErrorDetail::from)
                .collect();
            return Ok(RowReport {
                item: ValidationItem::new(row_number, errors, Vec::new()),
                row: row.clone(),
            });
        }

        let outcome = validate_and_fix_row(row, row_number, &self.rules, scope);
        let errors = outcome.violations.into_iter().map(ErrorDetail::from).collect();
        Ok(RowReport {
            item: ValidationItem::new(row_number, errors, outcome.corrections),
            row: outcome.row,
        })
    }
}

/// Applies one declarative policy.
#[derive(Debug, Clone)]
pub struct PolicyRowValidator {
    engine: PolicyRuleEngine,
}

impl PolicyRowValidator {
    /// Creates a validator for `policy`.
    pub fn new(policy: Arc<Policy>) -> catalog_rules::Result<Self> {
        Ok(Self {
            engine: PolicyRuleEngine::new(policy)?,
        })
    }

    /// The underlying policy.
    pub fn policy(&self) -> &Policy {
        self.engine.policy()
    }
}

impl SyncRowValidator for PolicyRowValidator {
    fn validate_row(
        &self,
        row: &Row,
        row_number: usize,
        _scope: &ValidationScope,
        auto_fix: bool,
    ) -> Result<RowReport, RowError> {
        let outcome = self.engine.validate_row(row);

        let (corrected, corrections) = if auto_fix {
            (
                PolicyRuleEngine::apply_corrections(row, &outcome),
                outcome.corrections,
            )
        } else {
            (row.clone(), Vec::new())
        };

        let mut item = ValidationItem::new(row_number, outcome.errors, corrections);
        if self.policy().fallback {
            item = item.with_metadata("policy_fallback", serde_json::Value::Bool(true));
        }
        Ok(RowReport {
            item,
            row: corrected,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_core::{CellValue, row_of};
    use catalog_rules::{MaxLengthRule, ProviderRules, SharedRule};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    struct Exploding;

    impl SyncRowValidator for Exploding {
        fn validate_row(
            &self,
            _row: &Row,
            _row_number: usize,
            _scope: &ValidationScope,
            _auto_fix: bool,
        ) -> Result<RowReport, RowError> {
            panic!("exploded");
        }
    }

    struct Echo;

    #[async_trait]
    impl AsyncRowValidator for Echo {
        async fn validate_row(
            &self,
            row: &Row,
            row_number: usize,
            _scope: &ValidationScope,
            _auto_fix: bool,
        ) -> Result<RowReport, RowError> {
            tokio::task::yield_now().await;
            Ok(RowReport {
                item: ValidationItem::new(row_number, Vec::new(), Vec::new()),
                row: row.clone(),
            })
        }
    }

    fn title_rules() -> RuleSet {
        let mut columns: BTreeMap<String, Vec<SharedRule>> = BTreeMap::new();
        columns.insert("title".into(), vec![Arc::new(MaxLengthRule::new(5)) as SharedRule]);
        std::iter::once(ProviderRules::Columns(columns)).collect()
    }

    #[tokio::test]
    async fn test_panics_become_row_errors() {
        let scope = ValidationScope::new("amazon", "books");
        let handle = RowValidatorHandle::from_sync(Exploding);

        let inline = handle.run(&Row::new(), 4, &scope, false).await;
        assert_eq!(inline.unwrap_err(), RowError::new(4, "exploded"));

        let dispatched = handle
            .dispatch(Row::new(), 5, Arc::new(scope), false, Arc::new(Semaphore::new(1)))
            .await;
        assert_eq!(dispatched.unwrap_err(), RowError::new(5, "exploded"));
    }

    #[tokio::test]
    async fn test_async_validator_runs_through_handle() {
        let scope = Arc::new(ValidationScope::new("amazon", "books"));
        let row = row_of([("title", "Dune")]);
        let report = RowValidatorHandle::from_async(Echo)
            .dispatch(row.clone(), 1, scope, true, Arc::new(Semaphore::new(1)))
            .await
            .unwrap();
        assert_eq!(report.row, row);
        assert!(report.item.errors.is_empty());
    }

    #[test]
    fn test_engine_validator_fix_modes() {
        let scope = ValidationScope::new("amazon", "books");
        let validator = EngineRowValidator::new(title_rules());
        let row = row_of([("title", "Foundation")]);

        let checked = validator.validate_row(&row, 1, &scope, false).unwrap();
        assert_eq!(checked.item.errors.len(), 1);
        assert!(checked.item.corrections.is_empty());
        assert_eq!(checked.row, row);

        let fixed = validator.validate_row(&row, 1, &scope, true).unwrap();
        assert!(fixed.item.errors.is_empty());
        assert_eq!(fixed.item.corrections.len(), 1);
        assert_eq!(fixed.row["title"], CellValue::from("Found"));
    }
}
