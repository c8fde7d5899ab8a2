use crate::types::*;

// Score-domain segmentation - routes rows of a statistical distribution to
// the domain whose interval contains the row's score, ignoring which page
// the row physically landed on. This is what keeps a distribution whole when
// a page break falls in the middle of it.

/// Route every data row to the first domain (in declaration order) whose
/// interval contains the value in `value_column`. Rows whose value won't
/// parse, or matches no domain, quarantine into `Unclassified`. Rows flagged
/// as headers by extraction are consumed as header metadata.
pub(crate) fn segment(
    page_tables: &[PageTable],
    domains: &[ScoreDomain],
    value_column: usize,
) -> Vec<LogicalTable> {
    // Domain tables open lazily, in declaration order
    let mut domain_tables: Vec<Option<LogicalTable>> = vec![None; domains.len()];
    let mut unclassified: Option<LogicalTable> = None;
    let mut shared_header: Option<Vec<String>> = None;

    // Document order: page ascending, row-within-page ascending. Which page
    // table a row came from is deliberately ignored.
    for page_table in page_tables {
        for row in &page_table.rows {
            if page_table.is_header_row(row.row_index) {
                if shared_header.is_none() {
                    shared_header = Some(row.cells.clone());
                }
                continue;
            }

            let value = row
                .cells
                .get(value_column)
                .and_then(|cell| parse_number(cell));

            let matched = value.and_then(|v| domains.iter().position(|d| d.contains(v)));

            match matched {
                Some(index) => {
                    let table = domain_tables[index].get_or_insert_with(|| {
                        let mut table =
                            LogicalTable::new(domains[index].name.clone(), TableKind::Domain);
                        table.domain = Some(domains[index].clone());
                        table
                    });
                    table.push_row(row);
                }
                None => {
                    unclassified
                        .get_or_insert_with(LogicalTable::unclassified)
                        .push_row(row);
                }
            }
        }
    }

    let mut tables: Vec<LogicalTable> = domain_tables
        .into_iter()
        .flatten()
        .map(|mut table| {
            table.header = shared_header.clone();
            table
        })
        .collect();

    if let Some(orphans) = unclassified {
        println!(
            "   ⚠️  {} rows matched no score domain, quarantined as {}",
            orphans.row_count(),
            UNCLASSIFIED_LABEL
        );
        tables.push(orphans);
    }

    tables
}
