use crate::config::{JobConfig, SegmentationStrategyConfig};
use crate::fingerprint::{config_hash, page_tables_fingerprint};
use crate::rules::{RuleRegistry, ValidationEngine};
use crate::segmentation::SegmentationEngine;
use crate::types::*;
use anyhow::{anyhow, Result};
use chrono::Utc;

/// Everything one conversion job produces: the table pair, the validation
/// report, and the audit metadata. The report never gates the tables: a
/// job that completes with errors in the report is still a completed job.
#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub tables: SegmentedTables,
    pub report: ValidationReport,
    pub metadata: JobMetadata,
}

/// Job-boundary orchestration: segment, validate, stamp the audit record.
/// The only hard failure is extraction handing over zero rows; everything
/// else completes and reports.
pub struct TableProcessor {
    segmentation: SegmentationEngine,
}

impl Default for TableProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TableProcessor {
    pub fn new() -> Self {
        Self {
            segmentation: SegmentationEngine::new(),
        }
    }

    pub fn process(&self, page_tables: Vec<PageTable>, config: &JobConfig) -> Result<JobOutcome> {
        config.validate()?;

        let input_row_count: usize = page_tables.iter().map(|p| p.rows.len()).sum();
        if input_row_count == 0 {
            return Err(anyhow!("extraction produced no rows, nothing to convert"));
        }

        println!(
            "⚙️  Processing job: {} rows on {} page tables",
            input_row_count,
            page_tables.len()
        );

        let input_fingerprint = page_tables_fingerprint(&page_tables);
        let strategy_hash = config_hash(&config.strategy)?;
        let page_count = page_tables.len();

        let tables = self.segmentation.segment(page_tables, &config.strategy)?;

        let report = if config.validation_enabled {
            ValidationEngine::new(self.registry_for(config)).validate_segmented(&tables)
        } else {
            println!("   ⏭️  Validation disabled for this job");
            ValidationReport::default()
        };

        let metadata = JobMetadata {
            strategy: config.strategy.name().to_string(),
            strategy_hash,
            input_fingerprint,
            page_count,
            input_row_count,
            logical_table_count: tables.logical_tables.len(),
            processed_at: Utc::now(),
        };

        Ok(JobOutcome {
            tables,
            report,
            metadata,
        })
    }

    /// Generic rules always run; score-domain jobs also get the
    /// statistical-distribution rules, keyed to the routing column.
    fn registry_for(&self, config: &JobConfig) -> RuleRegistry {
        match &config.strategy {
            SegmentationStrategyConfig::ScoreDomain { value_column, .. } => {
                RuleRegistry::standard(config.tolerance)
                    .with_distribution_rules(*value_column, config.tolerance)
            }
            _ => RuleRegistry::standard(config.tolerance),
        }
    }
}
