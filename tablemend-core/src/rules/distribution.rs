use crate::types::*;

use super::engine::{ColumnRef, Finding};

// Statistical-distribution rule bodies. These run only against tables
// carrying score-domain metadata. The engine enforces the scope; the
// bodies tolerate it being absent and stay total either way.

/// Values in the designated column must fall inside the table's own domain
/// interval.
pub(crate) fn domain_bounds(table: &LogicalTable, column: &ColumnRef) -> Vec<Finding> {
    let Some(domain) = table.domain.as_ref() else {
        return Vec::new();
    };
    let Some(index) = column.resolve(table) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for row in &table.rows {
        if let Some(value) = row.cells.get(index).and_then(|c| parse_number(c)) {
            if !domain.contains(value) {
                findings.push(Finding::at_row(
                    row.provenance,
                    format!(
                        "score {value} outside domain range [{}, {}]",
                        domain.min, domain.max
                    ),
                ));
            }
        }
    }

    findings
}

/// Cross-column coherence for frequency/percent/cumulative triples:
/// each cumulative step must equal the row's frequency, and each percent
/// must equal the row's share of the frequency total. This is the check
/// that catches a distribution corrupted by a mid-table page break.
pub(crate) fn coherence(
    table: &LogicalTable,
    frequency: &ColumnRef,
    percent: &ColumnRef,
    cumulative: &ColumnRef,
    tolerance: f64,
) -> Vec<Finding> {
    let Some(freq_index) = frequency.resolve(table) else {
        return Vec::new();
    };

    let mut findings = Vec::new();

    // Cumulative vs frequency: cum[0] = freq[0], cum[i] = cum[i-1] + freq[i]
    if let Some(cum_index) = cumulative.resolve(table) {
        let mut previous_cumulative: Option<f64> = None;
        for row in &table.rows {
            let freq = row.cells.get(freq_index).and_then(|c| parse_number(c));
            let cum = row.cells.get(cum_index).and_then(|c| parse_number(c));
            let (Some(freq), Some(cum)) = (freq, cum) else {
                continue;
            };
            let expected = previous_cumulative.unwrap_or(0.0) + freq;
            if (cum - expected).abs() > tolerance {
                findings.push(Finding::at_row(
                    row.provenance,
                    format!("cumulative {cum} does not follow from frequency {freq} (expected {expected})"),
                ));
            }
            // Continue from the reported value so one bad row doesn't
            // cascade down the rest of the column
            previous_cumulative = Some(cum);
        }
    }

    // Percent vs frequency share of the total
    if let Some(pct_index) = percent.resolve(table) {
        let total: f64 = table
            .rows
            .iter()
            .filter_map(|row| row.cells.get(freq_index).and_then(|c| parse_number(c)))
            .sum();
        if total > 0.0 {
            for row in &table.rows {
                let freq = row.cells.get(freq_index).and_then(|c| parse_number(c));
                let pct = row.cells.get(pct_index).and_then(|c| parse_number(c));
                let (Some(freq), Some(pct)) = (freq, pct) else {
                    continue;
                };
                let expected = freq / total * 100.0;
                if (pct - expected).abs() > tolerance {
                    findings.push(Finding::at_row(
                        row.provenance,
                        format!(
                            "percent {pct:.2} disagrees with frequency share {expected:.2} of total {total}"
                        ),
                    ));
                }
            }
        }
    }

    findings
}
