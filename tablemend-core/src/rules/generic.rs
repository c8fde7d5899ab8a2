use std::collections::HashMap;

use crate::types::*;

use super::engine::{ColumnRef, Finding};

// Generic rule bodies - every rule here is a total function over one
// immutable logical table. An unresolvable designated column makes the rule
// inapplicable (no findings), matching how keyword-based column lookup has
// always behaved upstream.

/// Percent column must sum to 100.00 within tolerance.
pub(crate) fn percent_total(table: &LogicalTable, column: &ColumnRef, tolerance: f64) -> Vec<Finding> {
    let Some(index) = column.resolve(table) else {
        return Vec::new();
    };

    let mut total = 0.0;
    let mut parsed = 0usize;
    for row in &table.rows {
        if let Some(value) = row.cells.get(index).and_then(|c| parse_number(c)) {
            total += value;
            parsed += 1;
        }
    }
    if parsed == 0 {
        return Vec::new();
    }

    if (total - 100.0).abs() > tolerance {
        vec![Finding::table_level(format!(
            "percent column sums to {total:.2}, expected 100.00 within ±{tolerance}"
        ))]
    } else {
        Vec::new()
    }
}

/// No two rows equal after normalizing whitespace and case on every cell.
pub(crate) fn no_duplicate_rows(table: &LogicalTable) -> Vec<Finding> {
    let mut first_seen: HashMap<Vec<String>, RowProvenance> = HashMap::new();
    let mut findings = Vec::new();

    for row in &table.rows {
        let key: Vec<String> = row.cells.iter().map(|c| normalize_cell(c)).collect();
        if key.iter().all(|c| c.is_empty()) {
            continue;
        }
        match first_seen.get(&key) {
            Some(original) => findings.push(Finding {
                rows: vec![*original, row.provenance],
                message: format!(
                    "row at page {} index {} duplicates the row at page {} index {}",
                    row.provenance.page,
                    row.provenance.row_index,
                    original.page,
                    original.row_index
                ),
            }),
            None => {
                first_seen.insert(key, row.provenance);
            }
        }
    }

    findings
}

/// Designated cumulative column must be non-decreasing in row order.
/// Unparsable cells are skipped.
pub(crate) fn monotonic_cumulative(table: &LogicalTable, column: &ColumnRef) -> Vec<Finding> {
    let Some(index) = column.resolve(table) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    let mut previous: Option<f64> = None;
    for row in &table.rows {
        let Some(value) = row.cells.get(index).and_then(|c| parse_number(c)) else {
            continue;
        };
        if let Some(prev) = previous {
            if value < prev {
                findings.push(Finding::at_row(
                    row.provenance,
                    format!("cumulative value {value} decreases after {prev}"),
                ));
            }
        }
        previous = Some(value);
    }

    findings
}

/// Designated numeric columns must hold values >= 0.
pub(crate) fn non_negative_counts(table: &LogicalTable, columns: &[ColumnRef]) -> Vec<Finding> {
    let mut findings = Vec::new();

    for column in columns {
        let Some(index) = column.resolve(table) else {
            continue;
        };
        for row in &table.rows {
            if let Some(value) = row.cells.get(index).and_then(|c| parse_number(c)) {
                if value < 0.0 {
                    findings.push(Finding::at_row(
                        row.provenance,
                        format!("negative count {value} in column {index}"),
                    ));
                }
            }
        }
    }

    findings
}

/// Header-before-data / no orphan rows. Rows that landed in the
/// `Unclassified` quarantine could not be attributed to any section or
/// domain; classified tables holding data with no recognized header are the
/// header-before-data half of the same problem.
pub(crate) fn orphan_rows(table: &LogicalTable) -> Vec<Finding> {
    if table.is_empty() {
        return Vec::new();
    }

    match table.kind {
        TableKind::Unclassified => {
            vec![Finding {
                rows: table.rows.iter().map(|r| r.provenance).collect(),
                message: format!(
                    "{} rows could not be attributed to any recognized section or domain",
                    table.row_count()
                ),
            }]
        }
        _ if table.header.is_none() => {
            vec![Finding::table_level(
                "table has data rows but no recognized header before them",
            )]
        }
        _ => Vec::new(),
    }
}
