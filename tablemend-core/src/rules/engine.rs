use crate::types::*;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};

use super::{distribution, generic};

pub const INTERNAL_FAILURE_RULE_ID: &str = "internal-rule-failure";

/// Designates a column either by position or by header name. Named lookup is
/// a case-insensitive substring match against the table header, so "cum"
/// finds both "Cumulative" and "Cum. Freq". A reference that resolves to
/// nothing makes the rule inapplicable for that table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Named(String),
}

impl ColumnRef {
    pub fn resolve(&self, table: &LogicalTable) -> Option<usize> {
        match self {
            Self::Index(index) => Some(*index),
            Self::Named(name) => table.column_by_name(name),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleScope {
    /// Runs against every logical table
    Generic,
    /// Runs only against tables carrying domain metadata
    Domain,
}

/// One finding of a rule body: which rows, and why. The engine turns these
/// into [`ValidationIssue`]s stamped with the rule's id and severity.
#[derive(Debug, Clone)]
pub struct Finding {
    pub rows: Vec<RowProvenance>,
    pub message: String,
}

impl Finding {
    pub fn table_level(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            message: message.into(),
        }
    }

    pub fn at_row(provenance: RowProvenance, message: impl Into<String>) -> Self {
        Self {
            rows: vec![provenance],
            message: message.into(),
        }
    }
}

/// A validation rule as data: each variant carries its parameters, and the
/// id, scope and severity are intrinsic to the variant. Evaluation is a pure
/// read-only pass over one logical table: rules can never create, delete,
/// or edit rows through any code path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Rule {
    /// Designated percent column must sum to 100.00 within tolerance
    PercentTotal { column: ColumnRef, tolerance: f64 },
    /// No two rows equal after whitespace/case normalization
    NoDuplicateRows,
    /// Designated cumulative column is non-decreasing in row order
    MonotonicCumulative { column: ColumnRef },
    /// Designated numeric columns hold values >= 0
    NonNegativeCounts { columns: Vec<ColumnRef> },
    /// Every row is attributable to a recognized section or domain, and
    /// tables with data have a recognized header before it
    OrphanRows,
    /// Values in the designated column fall inside the table's domain interval
    DomainBounds { column: ColumnRef },
    /// Frequency, percent and cumulative columns agree with each other
    DistributionCoherence {
        frequency: ColumnRef,
        percent: ColumnRef,
        cumulative: ColumnRef,
        tolerance: f64,
    },
}

impl Rule {
    pub fn id(&self) -> &'static str {
        match self {
            Self::PercentTotal { .. } => "percent-total",
            Self::NoDuplicateRows => "no-duplicate-rows",
            Self::MonotonicCumulative { .. } => "monotonic-cumulative",
            Self::NonNegativeCounts { .. } => "non-negative-counts",
            Self::OrphanRows => "orphan-rows",
            Self::DomainBounds { .. } => "domain-bounds",
            Self::DistributionCoherence { .. } => "distribution-coherence",
        }
    }

    pub fn scope(&self) -> RuleScope {
        match self {
            Self::DomainBounds { .. } | Self::DistributionCoherence { .. } => RuleScope::Domain,
            _ => RuleScope::Generic,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::OrphanRows | Self::DomainBounds { .. } => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn applies_to(&self, table: &LogicalTable) -> bool {
        match self.scope() {
            RuleScope::Generic => true,
            RuleScope::Domain => table.domain.is_some(),
        }
    }

    pub fn evaluate(&self, table: &LogicalTable) -> Vec<ValidationIssue> {
        let findings = match self {
            Self::PercentTotal { column, tolerance } => {
                generic::percent_total(table, column, *tolerance)
            }
            Self::NoDuplicateRows => generic::no_duplicate_rows(table),
            Self::MonotonicCumulative { column } => generic::monotonic_cumulative(table, column),
            Self::NonNegativeCounts { columns } => generic::non_negative_counts(table, columns),
            Self::OrphanRows => generic::orphan_rows(table),
            Self::DomainBounds { column } => distribution::domain_bounds(table, column),
            Self::DistributionCoherence {
                frequency,
                percent,
                cumulative,
                tolerance,
            } => distribution::coherence(table, frequency, percent, cumulative, *tolerance),
        };

        findings
            .into_iter()
            .map(|finding| ValidationIssue {
                rule_id: self.id().to_string(),
                severity: self.severity(),
                table_id: table.id,
                rows: finding.rows,
                message: finding.message,
            })
            .collect()
    }
}

/// Ordered collection of rules. Order matters only for readability of the
/// registry itself; report ordering is fixed by the engine's stable sort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleRegistry {
    pub rules: Vec<Rule>,
}

impl RuleRegistry {
    /// The minimum generic rule set, with default column designations that
    /// match the distribution/roster headers seen upstream.
    pub fn standard(tolerance: f64) -> Self {
        Self {
            rules: vec![
                Rule::PercentTotal {
                    column: ColumnRef::Named("percent".to_string()),
                    tolerance,
                },
                Rule::NoDuplicateRows,
                Rule::MonotonicCumulative {
                    column: ColumnRef::Named("cum".to_string()),
                },
                Rule::NonNegativeCounts {
                    columns: vec![
                        ColumnRef::Named("freq".to_string()),
                        ColumnRef::Named("count".to_string()),
                    ],
                },
                Rule::OrphanRows,
            ],
        }
    }

    /// Append the statistical-distribution domain rules. `value_column` is
    /// the same column the score-domain strategy routed on.
    pub fn with_distribution_rules(mut self, value_column: usize, tolerance: f64) -> Self {
        self.rules.push(Rule::DomainBounds {
            column: ColumnRef::Index(value_column),
        });
        self.rules.push(Rule::DistributionCoherence {
            frequency: ColumnRef::Named("freq".to_string()),
            percent: ColumnRef::Named("percent".to_string()),
            cumulative: ColumnRef::Named("cum".to_string()),
            tolerance,
        });
        self
    }

    pub fn push(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Evaluates a rule registry against logical tables and assembles the
/// report. Strictly read-only over its inputs. Rules are pure functions over
/// immutable tables, so each (table, rule) pair is fanned out in parallel;
/// the stable sort afterwards makes the report independent of evaluation
/// order, so two runs over identical inputs serialize byte-identically.
pub struct ValidationEngine {
    registry: RuleRegistry,
}

impl ValidationEngine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self, tables: &[LogicalTable]) -> ValidationReport {
        self.validate_with_seed(tables, &[])
    }

    /// Validate segmented output, folding the issues the segmentation pass
    /// itself recorded (header-consistency candidates) into the report.
    pub fn validate_segmented(&self, segmented: &SegmentedTables) -> ValidationReport {
        self.validate_with_seed(&segmented.logical_tables, &segmented.issues)
    }

    fn validate_with_seed(
        &self,
        tables: &[LogicalTable],
        seeded: &[ValidationIssue],
    ) -> ValidationReport {
        println!(
            "🔍 Validating {} logical tables against {} rules...",
            tables.len(),
            self.registry.len()
        );

        let pairs: Vec<(&LogicalTable, &Rule)> = tables
            .iter()
            .flat_map(|table| {
                self.registry
                    .rules
                    .iter()
                    .filter(|rule| rule.applies_to(table))
                    .map(move |rule| (table, rule))
            })
            .collect();

        let mut issues: Vec<ValidationIssue> = pairs
            .par_iter()
            .flat_map(|&(table, rule)| {
                evaluate_contained(rule.id(), table, || rule.evaluate(table))
            })
            .collect();

        issues.extend(seeded.iter().cloned());

        // When nothing at all could be classified, orphan findings escalate
        // to errors.
        let nothing_classified = !tables
            .iter()
            .any(|t| t.kind != TableKind::Unclassified && !t.is_empty());
        if nothing_classified {
            for issue in issues.iter_mut().filter(|i| i.rule_id == "orphan-rows") {
                issue.severity = Severity::Error;
            }
        }

        // Deterministic report order regardless of parallel evaluation
        issues.sort_by(|a, b| {
            (a.table_id, &a.rule_id, a.rows.first()).cmp(&(b.table_id, &b.rule_id, b.rows.first()))
        });

        let verdicts: Vec<TableVerdict> = tables
            .iter()
            .map(|table| TableVerdict {
                table_id: table.id,
                label: table.label.clone(),
                passed: !issues
                    .iter()
                    .any(|i| i.table_id == table.id && i.severity == Severity::Error),
            })
            .collect();

        let report = ValidationReport { issues, verdicts };
        println!(
            "   📊 {} issues found ({} errors, {} warnings), {}/{} tables passed",
            report.issues.len(),
            report.error_count(),
            report.warning_count(),
            report.verdicts.iter().filter(|v| v.passed).count(),
            report.verdicts.len()
        );

        report
    }
}

/// Per-rule boundary: one broken rule must never prevent other rules, or
/// other tables, from being evaluated. A panic inside the evaluation closure
/// becomes a single error-severity issue for that table/rule pair.
fn evaluate_contained(
    rule_id: &str,
    table: &LogicalTable,
    eval: impl FnOnce() -> Vec<ValidationIssue>,
) -> Vec<ValidationIssue> {
    match catch_unwind(AssertUnwindSafe(eval)) {
        Ok(found) => found,
        Err(_) => vec![ValidationIssue {
            rule_id: INTERNAL_FAILURE_RULE_ID.to_string(),
            severity: Severity::Error,
            table_id: table.id,
            rows: Vec::new(),
            message: format!("rule '{}' failed internally on table '{}'", rule_id, table.label),
        }],
    }
}
