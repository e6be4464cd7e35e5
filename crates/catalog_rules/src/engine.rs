//! Rule engine.
//!
//! Collects rules from the registered providers and evaluates them cell by
//! cell. The engine only accumulates violations; it never mutates its input
//! and does not catch panics raised by rules.

use crate::provider::{RuleProvider, RuleSet};
use crate::rule::{SharedRule, evaluate};
use catalog_core::{
    CellValue, CorrectionDetail, Row, RuleViolation, Table, ValidationContext, ValidationScope,
};
use std::sync::Arc;
use tracing::debug;

/// Outcome of validating and fixing one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowFixOutcome {
    /// The row with every committed fix applied
    pub row: Row,
    /// Violations remaining after fixing
    pub violations: Vec<RuleViolation>,
    /// Committed fixes, one per changed cell
    pub corrections: Vec<CorrectionDetail>,
}

/// Evaluates provider rules against tables and rows.
///
/// # Example
///
/// ```rust
/// use catalog_core::{row_of, Table, ValidationScope};
/// use catalog_rules::{MercadoLivreProvider, RuleEngine};
///
/// let mut engine = RuleEngine::new();
/// engine.register_provider(MercadoLivreProvider::new().unwrap());
///
/// let table = Table::from_rows(vec![row_of([
///     ("title", ""),
///     ("price", "10.99"),
///     ("stock", "5"),
/// ])]);
/// let scope = ValidationScope::new("mercadolivre", "electronics");
///
/// let violations = engine.validate(&table, &scope);
/// assert_eq!(violations.len(), 1);
/// assert_eq!(violations[0].column, "title");
/// ```
#[derive(Default, Clone)]
pub struct RuleEngine {
    providers: Vec<Arc<dyn RuleProvider>>,
    standalone: Vec<SharedRule>,
}

impl std::fmt::Debug for RuleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleEngine")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("standalone", &self.standalone.len())
            .finish()
    }
}

impl RuleEngine {
    /// Creates an engine with no rules.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a provider.
    pub fn register_provider(&mut self, provider: impl RuleProvider + 'static) -> &mut Self {
        self.providers.push(Arc::new(provider));
        self
    }

    /// Registers a shared provider.
    pub fn register_shared_provider(&mut self, provider: Arc<dyn RuleProvider>) -> &mut Self {
        self.providers.push(provider);
        self
    }

    /// Registers a standalone rule, applied to every column.
    pub fn register_rule(&mut self, rule: SharedRule) -> &mut Self {
        self.standalone.push(rule);
        self
    }

    /// Number of registered providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Merges every provider's rules, then the standalone rules, into one set.
    pub fn compile(&self, scope: &ValidationScope) -> RuleSet {
        let mut rules: RuleSet = self.providers.iter().map(|p| p.rules(scope)).collect();
        for rule in &self.standalone {
            rules.push_wildcard(Arc::clone(rule));
        }
        debug!(
            "Compiled {} rules for {}/{} from {} providers",
            rules.len(),
            scope.marketplace,
            scope.category,
            self.providers.len()
        );
        rules
    }

    /// Validates every cell of a table.
    pub fn validate(&self, table: &Table, scope: &ValidationScope) -> Vec<RuleViolation> {
        let rules = self.compile(scope);
        table
            .rows()
            .enumerate()
            .flat_map(|(idx, row)| validate_row(row, idx + 1, &rules, scope))
            .collect()
    }

    /// Validates one row against freshly compiled rules.
    pub fn validate_row(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
    ) -> Vec<RuleViolation> {
        validate_row(row, row_number, &self.compile(scope), scope)
    }

    /// Validates and fixes one row against freshly compiled rules.
    pub fn validate_and_fix_row(
        &self,
        row: &Row,
        row_number: usize,
        scope: &ValidationScope,
    ) -> RowFixOutcome {
        validate_and_fix_row(row, row_number, &self.compile(scope), scope)
    }
}

fn applicable<'r>(rules: &'r RuleSet, ctx: &ValidationContext<'_>) -> Vec<&'r SharedRule> {
    rules
        .resolve(ctx.column_name)
        .filter(|rule| rule.can_apply(ctx))
        .collect()
}

fn check_all(
    rules: &[&SharedRule],
    value: &CellValue,
    ctx: &ValidationContext<'_>,
) -> Vec<RuleViolation> {
    rules
        .iter()
        .filter_map(|rule| evaluate(rule.as_ref(), value, ctx))
        .collect()
}

/// Validates every present column of a row.
///
/// All applicable rules run for every cell; a cell may yield several
/// violations.
pub fn validate_row(
    row: &Row,
    row_number: usize,
    rules: &RuleSet,
    scope: &ValidationScope,
) -> Vec<RuleViolation> {
    let mut violations = Vec::new();
    for (column, value) in row {
        let ctx = scope.cell(row_number, column, row);
        violations.extend(check_all(&applicable(rules, &ctx), value, &ctx));
    }
    violations
}

/// Validates a row, applying the fixes rules offer.
///
/// For each cell, rules run in order and a failing rule's fix replaces the
/// working value. The final value is then checked against every applicable
/// rule: the fix is kept only if no blocking violation remains, otherwise the
/// original value and its violations are reported.
pub fn validate_and_fix_row(
    row: &Row,
    row_number: usize,
    rules: &RuleSet,
    scope: &ValidationScope,
) -> RowFixOutcome {
    let mut fixed = Row::new();
    let mut violations = Vec::new();
    let mut corrections = Vec::new();

    for (column, original) in row {
        let ctx = scope.cell(row_number, column, row);
        let cell_rules = applicable(rules, &ctx);

        let mut working = original.clone();
        let mut first_pass = Vec::new();
        let mut applied: Vec<(String, f64)> = Vec::new();

        for rule in &cell_rules {
            let Some(violation) = evaluate(rule.as_ref(), &working, &ctx) else {
                continue;
            };
            first_pass.push(violation);
            if let Some(fix) = rule.fix(&working, &ctx) {
                if fix.value != working {
                    working = fix.value;
                    applied.push((fix.correction_type, fix.confidence));
                }
            }
        }

        if applied.is_empty() {
            fixed.insert(column.clone(), original.clone());
            violations.extend(first_pass);
            continue;
        }

        let remaining = check_all(&cell_rules, &working, &ctx);
        if remaining.iter().any(RuleViolation::is_blocking) {
            debug!(
                "Discarding fix for row {} column '{}': value still invalid",
                row_number, column
            );
            fixed.insert(column.clone(), original.clone());
            violations.extend(check_all(&cell_rules, original, &ctx));
            continue;
        }

        let confidence = applied.iter().map(|(_, c)| *c).fold(1.0, f64::min);
        let correction_type = applied
            .last()
            .map(|(t, _)| t.clone())
            .unwrap_or_default();
        let correction = CorrectionDetail::new(
            column.clone(),
            original.clone(),
            working.clone(),
            correction_type,
        );
        if let Some(correction) = correction {
            corrections.push(correction.with_confidence(confidence));
        }
        fixed.insert(column.clone(), working);
        violations.extend(remaining);
    }

    RowFixOutcome {
        row: fixed,
        violations,
        corrections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        EnumRule, MaxLengthRule, NumericRangeRule, ProviderRules, RequiredFieldRule,
        StockQuantityRule,
    };
    use catalog_core::{Severity, row_of};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    struct Columns(Vec<(&'static str, Vec<SharedRule>)>);

    impl RuleProvider for Columns {
        fn name(&self) -> &str {
            "columns"
        }

        fn rules(&self, _scope: &ValidationScope) -> ProviderRules {
            let map: BTreeMap<String, Vec<SharedRule>> = self
                .0
                .iter()
                .map(|(c, r)| (c.to_string(), r.clone()))
                .collect();
            ProviderRules::Columns(map)
        }
    }

    fn scope() -> ValidationScope {
        ValidationScope::new("amazon", "books")
    }

    #[test]
    fn test_all_rules_run_per_cell() {
        let mut engine = RuleEngine::new();
        engine.register_provider(Columns(vec![(
            "title",
            vec![
                Arc::new(MaxLengthRule::new(3)) as SharedRule,
                Arc::new(EnumRule::new(["a"])),
            ],
        )]));

        let row = row_of([("title", "abcdef")]);
        let violations = engine.validate_row(&row, 4, &scope());

        let codes: Vec<_> = violations.iter().map(|v| v.code.as_str()).collect();
        assert_eq!(codes, vec!["MAX_LENGTH", "INVALID_ENUM"]);
        assert!(violations.iter().all(|v| v.row == 4));
        assert_eq!(violations[0].rule_id.as_deref(), Some("max_length"));
    }

    #[test]
    fn test_standalone_rules_apply_to_every_column() {
        let mut engine = RuleEngine::new();
        engine.register_rule(Arc::new(MaxLengthRule::new(2)));

        let table = Table::from_rows(vec![row_of([("a", "xxx"), ("b", "yyy"), ("c", "z")])]);
        let violations = engine.validate(&table, &scope());

        let columns: Vec<_> = violations.iter().map(|v| v.column.as_str()).collect();
        assert_eq!(columns, vec!["a", "b"]);
    }

    #[test]
    fn test_fix_committed_when_final_value_passes() {
        let mut engine = RuleEngine::new();
        engine.register_provider(Columns(vec![
            ("condition", vec![Arc::new(EnumRule::new(["new", "used"])) as SharedRule]),
            ("stock", vec![Arc::new(StockQuantityRule::new()) as SharedRule]),
        ]));

        let row = row_of([("condition", "New"), ("stock", "-4")]);
        let outcome = engine.validate_and_fix_row(&row, 1, &scope());

        assert!(outcome.violations.is_empty());
        assert_eq!(outcome.row["condition"], CellValue::from("new"));
        assert_eq!(outcome.row["stock"], CellValue::from("0"));
        assert_eq!(outcome.corrections.len(), 2);
        assert_eq!(outcome.corrections[1].correction_type, "stock_floor");
        assert_eq!(outcome.corrections[1].confidence, 0.6);
        assert_eq!(row["stock"], CellValue::from("-4"));
    }

    #[test]
    fn test_fix_discarded_when_still_invalid() {
        let mut engine = RuleEngine::new();
        engine.register_provider(Columns(vec![(
            "price",
            vec![
                Arc::new(NumericRangeRule::new(100.0, 200.0).unwrap()) as SharedRule,
            ],
        )]));

        // "10,50" normalizes to 10.50, which is still below the minimum
        let row = row_of([("price", "10,50")]);
        let outcome = engine.validate_and_fix_row(&row, 1, &scope());

        assert!(outcome.corrections.is_empty());
        assert_eq!(outcome.row["price"], CellValue::from("10,50"));
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].code, "NOT_NUMERIC");
    }

    #[test]
    fn test_warnings_survive_committed_fix() {
        let mut engine = RuleEngine::new();
        engine.register_provider(Columns(vec![(
            "image",
            vec![Arc::new(crate::ImageUrlRule::new()) as SharedRule],
        )]));

        let row = row_of([("image", "cdn.example.com/photo.pdf")]);
        let outcome = engine.validate_and_fix_row(&row, 1, &scope());

        assert_eq!(
            outcome.row["image"],
            CellValue::from("https://cdn.example.com/photo.pdf")
        );
        assert_eq!(outcome.violations.len(), 1);
        assert_eq!(outcome.violations[0].severity, Severity::Warning);
    }

    #[test]
    fn test_unfixable_violations_reported_once() {
        let mut engine = RuleEngine::new();
        engine.register_provider(Columns(vec![(
            "title",
            vec![Arc::new(RequiredFieldRule::new()) as SharedRule],
        )]));

        let row = row_of([("title", "")]);
        let outcome = engine.validate_and_fix_row(&row, 1, &scope());

        assert_eq!(outcome.violations.len(), 1);
        assert!(outcome.corrections.is_empty());
        assert_eq!(outcome.row, row);
    }
}
