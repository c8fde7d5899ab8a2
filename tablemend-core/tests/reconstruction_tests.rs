//! Reconstruction boundary tests: pin the library-level behavior.
//!
//! These tests exercise the public surface end to end and assert the
//! properties the downstream writers rely on:
//!
//! - Segmentation scenarios: score-domain routing, roster stitching,
//!   quarantine of unattributable rows
//! - Validation scenarios: report shape, verdicts, severities
//! - Structural properties: order preservation, completeness,
//!   page-boundary independence, report determinism
//!
//! No fixtures on disk. Every input is built inline, so a failure here is
//! a behavior change, not an environment problem.

use tablemend_core::*;

// ============================================================================
// Input builders
// ============================================================================

fn row(page: u32, row_index: u32, cells: &[&str]) -> RawRow {
    RawRow {
        cells: cells.iter().map(|c| c.to_string()).collect(),
        page,
        row_index,
        source_table: format!("p{page}-t0"),
    }
}

fn score_strategy() -> SegmentationStrategyConfig {
    SegmentationStrategyConfig::ScoreDomain {
        domains: vec![
            ScoreDomain::new("Lower", 0.0, 19.0),
            ScoreDomain::new("Upper", 20.0, 40.0),
        ],
        value_column: 0,
        disjoint: false,
    }
}

fn roster_strategy() -> SegmentationStrategyConfig {
    SegmentationStrategyConfig::HeaderRepetition {
        signature: HeaderSignature::new(["Name", "Position", "Department"]),
        section_title_patterns: vec![],
    }
}

// ============================================================================
// Score-domain scenarios
// ============================================================================

mod score_domain_scenarios {
    use super::*;

    #[test]
    fn values_split_across_pages_form_two_domain_tables() {
        // Values 5, 25, 19, 20 with domains [0,19] and [20,40] → two tables
        // of two rows each, document order preserved within each
        let pages = vec![
            PageTable::new(1, vec![row(1, 0, &["5", "x"]), row(1, 1, &["25", "x"])]),
            PageTable::new(2, vec![row(2, 0, &["19", "x"]), row(2, 1, &["20", "x"])]),
        ];

        let segmented = SegmentationEngine::new()
            .segment(pages, &score_strategy())
            .unwrap();

        assert_eq!(segmented.logical_tables.len(), 2);
        let lower = &segmented.logical_tables[0];
        let upper = &segmented.logical_tables[1];

        assert_eq!(lower.label, "Lower");
        assert_eq!(
            lower.rows.iter().map(|r| r.cells[0].as_str()).collect::<Vec<_>>(),
            vec!["5", "19"]
        );
        assert_eq!(
            upper.rows.iter().map(|r| r.cells[0].as_str()).collect::<Vec<_>>(),
            vec!["25", "20"]
        );
    }

    #[test]
    fn unparsable_score_quarantines_and_job_still_completes() {
        let pages = vec![PageTable::new(
            1,
            vec![row(1, 0, &["5", "x"]), row(1, 1, &["not a score", "x"])],
        )];

        let outcome = TableProcessor::new()
            .process(pages, &JobConfig::new(score_strategy()))
            .unwrap();

        let quarantine = outcome
            .tables
            .logical_tables
            .iter()
            .find(|t| t.kind == TableKind::Unclassified)
            .expect("unclassified table expected");
        assert_eq!(quarantine.row_count(), 1);

        let orphan_issue = outcome
            .tables
            .issues
            .iter()
            .chain(outcome.report.issues.iter())
            .find(|i| i.rule_id == "orphan-rows")
            .expect("orphan-rows issue expected");
        assert_eq!(orphan_issue.severity, Severity::Warning);
    }
}

// ============================================================================
// Header-repetition scenarios
// ============================================================================

mod header_repetition_scenarios {
    use super::*;

    #[test]
    fn two_page_roster_becomes_one_table_with_no_consistency_issues() {
        // Page 2 repeats page 1's header verbatim → single logical table,
        // the page-2 header row discarded, zero header-consistency issues
        let pages = vec![
            PageTable::new(
                1,
                vec![
                    row(1, 0, &["Name", "Position", "Department"]),
                    row(1, 1, &["Ada", "Engineer", "Computing"]),
                    row(1, 2, &["Grace", "Admiral", "Navy"]),
                ],
            ),
            PageTable::new(
                2,
                vec![
                    row(2, 0, &["Name", "Position", "Department"]),
                    row(2, 1, &["Edith", "Engineer", "Telephony"]),
                ],
            ),
        ];

        let segmented = SegmentationEngine::new()
            .segment(pages, &roster_strategy())
            .unwrap();

        assert_eq!(segmented.logical_tables.len(), 1);
        assert_eq!(segmented.logical_tables[0].row_count(), 3);
        assert!(
            !segmented.issues.iter().any(|i| i.rule_id == "header-consistency"),
            "verbatim repeated header must not raise consistency issues"
        );
    }

    #[test]
    fn orphans_before_the_first_header_are_quarantined_not_dropped() {
        let pages = vec![PageTable::new(
            1,
            vec![
                row(1, 0, &["stray", "cells", "here"]),
                row(1, 1, &["Name", "Position", "Department"]),
                row(1, 2, &["Ada", "Engineer", "Computing"]),
            ],
        )];

        let segmented = SegmentationEngine::new()
            .segment(pages, &roster_strategy())
            .unwrap();

        let quarantine = segmented
            .logical_tables
            .iter()
            .find(|t| t.kind == TableKind::Unclassified)
            .expect("unclassified table expected");
        assert_eq!(quarantine.row_count(), 1);
        assert_eq!(segmented.logical_row_count(), 2, "nothing silently dropped");
    }
}

// ============================================================================
// Validation scenarios
// ============================================================================

mod validation_scenarios {
    use super::*;

    #[test]
    fn percent_sum_off_by_one_fails_exactly_once() {
        // Percent column sums to 99.00 against tolerance ±0.02 → exactly one
        // error-severity percent-total issue, table verdict failed
        let mut page = PageTable::new(
            1,
            vec![
                row(1, 0, &["Item", "Percent"]),
                row(1, 1, &["a", "49.50"]),
                row(1, 2, &["b", "49.50"]),
            ],
        );
        page.header_rows = vec![0];

        let segmented = SegmentationEngine::new()
            .segment(vec![page], &SegmentationStrategyConfig::Passthrough)
            .unwrap();
        let report =
            ValidationEngine::new(RuleRegistry::standard(0.02)).validate_segmented(&segmented);

        let percent_issues: Vec<_> = report
            .issues
            .iter()
            .filter(|i| i.rule_id == "percent-total")
            .collect();
        assert_eq!(percent_issues.len(), 1);
        assert_eq!(percent_issues[0].severity, Severity::Error);
        assert_eq!(report.error_count(), 1);
        assert!(!report.verdicts[0].passed);
    }

    #[test]
    fn report_surfaces_but_never_blocks_the_tables() {
        // Broken data → failed verdicts, but the outcome still carries the
        // full table pair for the writers
        let pages = vec![PageTable::new(
            1,
            vec![row(1, 0, &["5", "x"]), row(1, 1, &["5", "x"])],
        )];

        let outcome = TableProcessor::new()
            .process(pages, &JobConfig::new(score_strategy()))
            .unwrap();

        assert!(outcome
            .report
            .issues
            .iter()
            .any(|i| i.rule_id == "no-duplicate-rows"));
        assert!(!outcome.report.passed());
        assert_eq!(outcome.tables.logical_row_count(), 2);
    }
}

// ============================================================================
// Structural properties
// ============================================================================

mod properties {
    use super::*;

    fn mixed_document() -> Vec<PageTable> {
        let mut page1 = PageTable::new(
            1,
            vec![
                row(1, 0, &["Score", "Frequency"]),
                row(1, 1, &["5", "3"]),
                row(1, 2, &["25", "1"]),
                row(1, 3, &["12", "2"]),
            ],
        );
        page1.header_rows = vec![0];
        let page2 = PageTable::new(
            2,
            vec![
                row(2, 0, &["19", "4"]),
                row(2, 1, &["oops", "9"]),
                row(2, 2, &["40", "1"]),
            ],
        );
        vec![page1, page2]
    }

    #[test]
    fn every_logical_row_resolves_and_order_is_preserved() {
        let segmented = SegmentationEngine::new()
            .segment(mixed_document(), &score_strategy())
            .unwrap();

        for table in &segmented.logical_tables {
            for window in table.rows.windows(2) {
                assert!(
                    window[0].provenance <= window[1].provenance,
                    "rows within '{}' must stay in document order",
                    table.label
                );
            }
            for logical_row in &table.rows {
                let source = segmented
                    .resolve(logical_row.provenance)
                    .expect("provenance must always resolve");
                assert_eq!(source.cells, logical_row.cells);
            }
        }
    }

    #[test]
    fn completeness_accounts_for_every_row() {
        // Logical rows = input rows minus rows consumed as header markers
        let segmented = SegmentationEngine::new()
            .segment(mixed_document(), &score_strategy())
            .unwrap();

        let marker_rows = 1; // the flagged header on page 1
        assert_eq!(
            segmented.logical_row_count(),
            segmented.input_row_count() - marker_rows
        );
    }

    #[test]
    fn completeness_holds_for_header_repetition_too() {
        let pages = vec![
            PageTable::new(
                1,
                vec![
                    row(1, 0, &["Name", "Position", "Department"]),
                    row(1, 1, &["Faculty", "", ""]),
                    row(1, 2, &["Ada", "Engineer", "Computing"]),
                ],
            ),
            PageTable::new(
                2,
                vec![
                    row(2, 0, &["Name", "Position", "Department"]),
                    row(2, 1, &["Grace", "Admiral", "Navy"]),
                ],
            ),
        ];

        let segmented = SegmentationEngine::new()
            .segment(pages, &roster_strategy())
            .unwrap();

        // Two header rows + one section title are markers; two data rows stay
        let marker_rows = 3;
        assert_eq!(
            segmented.logical_row_count(),
            segmented.input_row_count() - marker_rows
        );
        assert_eq!(segmented.logical_tables[0].label, "Faculty");
    }

    #[test]
    fn domain_assignment_ignores_page_boundaries() {
        // Same rows in the same document order, page break moved → identical
        // domain assignment
        let split_early = vec![
            PageTable::new(1, vec![row(1, 0, &["5", "a"])]),
            PageTable::new(
                2,
                vec![row(2, 0, &["25", "b"]), row(2, 1, &["19", "c"]), row(2, 2, &["20", "d"])],
            ),
        ];
        let split_late = vec![
            PageTable::new(
                1,
                vec![row(1, 0, &["5", "a"]), row(1, 1, &["25", "b"]), row(1, 2, &["19", "c"])],
            ),
            PageTable::new(2, vec![row(2, 0, &["20", "d"])]),
        ];

        let engine = SegmentationEngine::new();
        let first = engine.segment(split_early, &score_strategy()).unwrap();
        let second = engine.segment(split_late, &score_strategy()).unwrap();

        let cells_by_table = |segmented: &SegmentedTables| -> Vec<(String, Vec<Vec<String>>)> {
            segmented
                .logical_tables
                .iter()
                .map(|t| {
                    (
                        t.label.clone(),
                        t.rows.iter().map(|r| r.cells.clone()).collect(),
                    )
                })
                .collect()
        };

        assert_eq!(cells_by_table(&first), cells_by_table(&second));
    }

    #[test]
    fn validation_is_deterministic_to_the_byte() {
        let segmented = SegmentationEngine::new()
            .segment(mixed_document(), &score_strategy())
            .unwrap();
        let engine = ValidationEngine::new(
            RuleRegistry::standard(0.02).with_distribution_rules(0, 0.02),
        );

        let first = serde_json::to_vec(&engine.validate_segmented(&segmented)).unwrap();
        let second = serde_json::to_vec(&engine.validate_segmented(&segmented)).unwrap();
        assert_eq!(first, second, "identical inputs must serialize identically");
    }
}
