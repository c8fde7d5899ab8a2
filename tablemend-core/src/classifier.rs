use std::collections::HashMap;

use crate::config::{HeaderSignature, SegmentationStrategyConfig};
use crate::types::*;

/// Strategy picked from row shapes, with a confidence score so callers can
/// decide whether to trust it or fall back to an explicit configuration.
#[derive(Debug, Clone)]
pub struct ClassifiedStrategy {
    pub strategy: SegmentationStrategyConfig,
    pub confidence: f32,
}

/// Shape-based strategy auto-detection for documents that arrive without an
/// explicit configuration. Purely advisory: the segmentation engine only
/// ever consumes the returned config and never calls back in here.
pub struct StrategyClassifier {
    /// Share of data rows whose first cell must parse numerically before the
    /// document counts as a score distribution
    numeric_share_threshold: f32,
    /// Gap between consecutive distinct values that starts a new domain
    domain_gap: f64,
}

impl Default for StrategyClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StrategyClassifier {
    pub fn new() -> Self {
        Self {
            numeric_share_threshold: 0.7,
            domain_gap: 5.0,
        }
    }

    pub fn classify(&self, page_tables: &[PageTable]) -> ClassifiedStrategy {
        println!("🔍 Detecting segmentation strategy from row shapes...");

        if let Some(domains) = self.detect_score_domains(page_tables) {
            println!(
                "📋 Detected score distribution with {} domains (confidence: 0.80)",
                domains.len()
            );
            return ClassifiedStrategy {
                strategy: SegmentationStrategyConfig::ScoreDomain {
                    domains,
                    value_column: 0,
                    disjoint: false,
                },
                confidence: 0.8,
            };
        }

        if let Some(signature) = detect_repeated_header(page_tables) {
            println!("📋 Detected repeated header row (confidence: 0.70)");
            return ClassifiedStrategy {
                strategy: SegmentationStrategyConfig::HeaderRepetition {
                    signature,
                    section_title_patterns: Vec::new(),
                },
                confidence: 0.7,
            };
        }

        println!("📋 No recognized structure, falling back to passthrough (confidence: 0.50)");
        ClassifiedStrategy {
            strategy: SegmentationStrategyConfig::Passthrough,
            confidence: 0.5,
        }
    }

    /// A document is score-domain shaped when most data rows lead with a
    /// number. Domains come from natural breaks in the value distribution:
    /// sorted distinct values split wherever consecutive values gap apart.
    fn detect_score_domains(&self, page_tables: &[PageTable]) -> Option<Vec<ScoreDomain>> {
        let mut values = Vec::new();
        let mut data_rows = 0usize;

        for page_table in page_tables {
            for row in &page_table.rows {
                if page_table.is_header_row(row.row_index) {
                    continue;
                }
                data_rows += 1;
                if let Some(value) = row.cells.first().and_then(|c| parse_number(c)) {
                    values.push(value);
                }
            }
        }

        if data_rows < 2 || (values.len() as f32) < (data_rows as f32) * self.numeric_share_threshold
        {
            return None;
        }

        values.sort_by(f64::total_cmp);
        values.dedup();

        let mut domains = Vec::new();
        let mut range_start = values[0];
        let mut previous = values[0];
        for &value in &values[1..] {
            if value - previous > self.domain_gap {
                domains.push(range_domain(range_start, previous));
                range_start = value;
            }
            previous = value;
        }
        domains.push(range_domain(range_start, previous));

        Some(domains)
    }
}

fn range_domain(min: f64, max: f64) -> ScoreDomain {
    ScoreDomain::new(
        format!("Range {}-{}", format_value(min), format_value(max)),
        min,
        max,
    )
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// First row pattern that repeats (normalized, all cells populated) becomes
/// the header signature. Scanning in document order keeps detection
/// deterministic.
fn detect_repeated_header(page_tables: &[PageTable]) -> Option<HeaderSignature> {
    let mut counts: HashMap<Vec<String>, usize> = HashMap::new();
    let mut first_raw: HashMap<Vec<String>, Vec<String>> = HashMap::new();

    for page_table in page_tables {
        for row in &page_table.rows {
            if row.cells.is_empty() || row.cells.iter().any(|c| c.trim().is_empty()) {
                continue;
            }
            let key: Vec<String> = row.cells.iter().map(|c| normalize_cell(c)).collect();
            let count = counts.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                first_raw.insert(
                    key.clone(),
                    row.cells.iter().map(|c| c.trim().to_string()).collect(),
                );
            }
            if *count == 2 {
                return first_raw.remove(&key).map(HeaderSignature::new);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(page: u32, row_index: u32, cells: &[&str]) -> RawRow {
        RawRow {
            cells: cells.iter().map(|c| c.to_string()).collect(),
            page,
            row_index,
            source_table: format!("p{page}-t0"),
        }
    }

    #[test]
    fn test_numeric_first_column_detected_as_score_domain() {
        let pages = vec![PageTable::new(
            1,
            vec![
                row(1, 0, &["1", "a"]),
                row(1, 1, &["2", "b"]),
                row(1, 2, &["3", "c"]),
                row(1, 3, &["15", "d"]),
                row(1, 4, &["16", "e"]),
            ],
        )];

        let classified = StrategyClassifier::new().classify(&pages);
        assert!(classified.confidence > 0.7);
        match classified.strategy {
            SegmentationStrategyConfig::ScoreDomain { domains, .. } => {
                // Gap between 3 and 15 splits the values into two ranges
                assert_eq!(domains.len(), 2);
                assert_eq!(domains[0].name, "Range 1-3");
                assert_eq!(domains[1].name, "Range 15-16");
            }
            other => panic!("expected score_domain, got {}", other.name()),
        }
    }

    #[test]
    fn test_repeated_header_detected() {
        let pages = vec![
            PageTable::new(
                1,
                vec![
                    row(1, 0, &["Name", "Role"]),
                    row(1, 1, &["Ada", "Engineer"]),
                ],
            ),
            PageTable::new(
                2,
                vec![
                    row(2, 0, &["NAME", "ROLE"]),
                    row(2, 1, &["Grace", "Admiral"]),
                ],
            ),
        ];

        let classified = StrategyClassifier::new().classify(&pages);
        match classified.strategy {
            SegmentationStrategyConfig::HeaderRepetition { signature, .. } => {
                // Signature keeps the raw cells of the first occurrence
                assert_eq!(signature.cells, vec!["Name".to_string(), "Role".to_string()]);
            }
            other => panic!("expected header_repetition, got {}", other.name()),
        }
    }

    #[test]
    fn test_unstructured_rows_fall_back_to_passthrough() {
        let pages = vec![PageTable::new(
            1,
            vec![row(1, 0, &["alpha", "beta"]), row(1, 1, &["gamma", ""])],
        )];

        let classified = StrategyClassifier::new().classify(&pages);
        assert!(matches!(
            classified.strategy,
            SegmentationStrategyConfig::Passthrough
        ));
        assert!(classified.confidence < 0.7);
    }

    #[test]
    fn test_single_row_is_not_a_distribution() {
        let pages = vec![PageTable::new(1, vec![row(1, 0, &["42", "x"])])];
        let classified = StrategyClassifier::new().classify(&pages);
        assert!(matches!(
            classified.strategy,
            SegmentationStrategyConfig::Passthrough
        ));
    }
}
