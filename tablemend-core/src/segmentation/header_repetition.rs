use crate::config::HeaderSignature;
use crate::types::*;
use regex::Regex;

// Header-repetition segmentation - stitches roster-style tables back
// together by recognizing the header row that extraction repeats at the top
// of every page. The first signature match opens the logical table and
// becomes its schema; later matches are page-break artifacts and are
// discarded after a consistency check.

const DEFAULT_SECTION_LABEL: &str = "Section";

/// Single pass over all rows in document order. Engine state (current open
/// table, active header schema) is local to one invocation and discarded
/// afterward.
pub(crate) fn segment(
    page_tables: &[PageTable],
    signature: &HeaderSignature,
    title_patterns: &[Regex],
) -> (Vec<LogicalTable>, Vec<ValidationIssue>) {
    let mut current: Option<LogicalTable> = None;
    // Trimmed raw cells of the opening header; repeated headers are compared
    // against this, not against the normalized signature
    let mut active_schema: Option<Vec<String>> = None;
    let mut labeled = false;
    let mut unclassified: Option<LogicalTable> = None;
    let mut issues = Vec::new();

    for page_table in page_tables {
        for row in &page_table.rows {
            if signature.matches(&row.cells) {
                let trimmed = trimmed_cells(row);
                match current.as_ref() {
                    None => {
                        let mut table = LogicalTable::new(DEFAULT_SECTION_LABEL, TableKind::Section);
                        table.header = Some(trimmed.clone());
                        active_schema = Some(trimmed);
                        current = Some(table);
                    }
                    Some(table) => {
                        // Repeated header, typically right after a page break.
                        // The signature match guarantees normalized equality;
                        // raw drift (case, spelling) is what we flag here.
                        if active_schema.as_deref() != Some(&trimmed[..]) {
                            issues.push(ValidationIssue {
                                rule_id: "header-consistency".to_string(),
                                severity: Severity::Warning,
                                table_id: table.id,
                                rows: vec![row.provenance()],
                                message: format!(
                                    "repeated header on page {} differs from the opening header",
                                    row.page
                                ),
                            });
                        }
                        // Discarded either way - never a data row
                    }
                }
                continue;
            }

            if let Some(table) = current.as_mut() {
                if is_section_title(row, title_patterns) {
                    // Consumed as a marker; first title names the table
                    if !labeled {
                        table.label = row.cells[0].trim().to_string();
                        labeled = true;
                    }
                    continue;
                }
                table.push_row(row);
            } else {
                // No table open yet: orphan candidate
                unclassified
                    .get_or_insert_with(LogicalTable::unclassified)
                    .push_row(row);
            }
        }
    }

    let mut tables = Vec::new();
    if let Some(table) = current {
        tables.push(table);
    }
    if let Some(orphans) = unclassified {
        println!(
            "   ⚠️  {} rows appeared before any recognized header, quarantined as {}",
            orphans.row_count(),
            UNCLASSIFIED_LABEL
        );
        tables.push(orphans);
    }

    (tables, issues)
}

fn trimmed_cells(row: &RawRow) -> Vec<String> {
    row.cells.iter().map(|c| c.trim().to_string()).collect()
}

/// Section titles span the table as a single populated cell: first cell
/// non-empty, every other cell empty. When title patterns are configured the
/// cell text must also match one of them.
fn is_section_title(row: &RawRow, title_patterns: &[Regex]) -> bool {
    if row.cells.len() < 2 {
        return false;
    }
    let first = row.cells[0].trim();
    if first.is_empty() || row.cells[1..].iter().any(|c| !c.trim().is_empty()) {
        return false;
    }
    title_patterns.is_empty() || title_patterns.iter().any(|p| p.is_match(first))
}
