use crate::config::{compile_title_patterns, SegmentationStrategyConfig};
use crate::types::*;
use anyhow::Result;

use super::{header_repetition, score_domain};

/// Reconstructs logical tables from page-ordered raw rows.
///
/// One invocation = one conversion job. The engine holds no state between
/// calls, performs no I/O, and leaves the page tables untouched; they come
/// back inside the output as the traceability view. Misconfiguration is
/// rejected before the first row is read; malformed row data never aborts
/// the job, it quarantines into the `Unclassified` table instead.
pub struct SegmentationEngine;

impl Default for SegmentationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentationEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn segment(
        &self,
        page_tables: Vec<PageTable>,
        strategy: &SegmentationStrategyConfig,
    ) -> Result<SegmentedTables> {
        // Fail fast on configuration errors, before any row processing
        strategy.validate()?;

        let total_rows: usize = page_tables.iter().map(|p| p.rows.len()).sum();
        println!(
            "🧩 Segmenting {} rows across {} page tables ({} strategy)...",
            total_rows,
            page_tables.len(),
            strategy.name()
        );

        let (logical_tables, issues) = match strategy {
            SegmentationStrategyConfig::Passthrough => (passthrough(&page_tables), Vec::new()),
            SegmentationStrategyConfig::ScoreDomain {
                domains,
                value_column,
                ..
            } => (
                score_domain::segment(&page_tables, domains, *value_column),
                Vec::new(),
            ),
            SegmentationStrategyConfig::HeaderRepetition {
                signature,
                section_title_patterns,
            } => {
                let title_patterns = compile_title_patterns(section_title_patterns)?;
                header_repetition::segment(&page_tables, signature, &title_patterns)
            }
        };

        let kept: usize = logical_tables.iter().map(|t| t.rows.len()).sum();
        println!(
            "   ✅ {} logical tables, {} rows kept, {} issues recorded",
            logical_tables.len(),
            kept,
            issues.len()
        );

        Ok(SegmentedTables {
            page_tables,
            logical_tables,
            issues,
        })
    }
}

/// Passthrough: one logical table per page table, rows copied verbatim with
/// provenance. Rows extraction flagged as headers become the table's header
/// metadata instead of data rows.
fn passthrough(page_tables: &[PageTable]) -> Vec<LogicalTable> {
    let mut tables = Vec::new();

    for page_table in page_tables {
        let mut table = LogicalTable::new(format!("Page {}", page_table.page), TableKind::Passthrough);

        for row in &page_table.rows {
            if page_table.is_header_row(row.row_index) {
                if table.header.is_none() {
                    table.header = Some(row.cells.clone());
                }
                continue;
            }
            table.push_row(row);
        }

        tables.push(table);
    }

    tables
}
