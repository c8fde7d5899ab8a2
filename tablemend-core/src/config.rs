use crate::types::{normalize_cell, ScoreDomain};
use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

// Default value functions for serde
fn default_true() -> bool {
    true
}

fn default_tolerance() -> f64 {
    0.02
}

/// Misconfiguration detected before any row is processed. Fatal to the
/// call: the document-type collaborator set the job up wrong.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("score domain '{name}' is ill-formed: min {min} is greater than max {max}")]
    IllFormedDomain { name: String, min: f64, max: f64 },

    #[error("score-domain strategy declares no domains")]
    NoDomains,

    #[error(
        "score domains '{first}' and '{second}' overlap on [{lo}, {hi}] \
         but disjoint coverage was requested"
    )]
    OverlappingDomains {
        first: String,
        second: String,
        lo: f64,
        hi: f64,
    },

    #[error("header signature has no cells")]
    EmptySignature,

    #[error("section title pattern '{pattern}' is not a valid regex: {source}")]
    BadTitlePattern {
        pattern: String,
        source: regex::Error,
    },

    #[error("validation tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),
}

/// Exact cell-sequence match used to recognize a (possibly repeated) header
/// row. Matching happens on normalized cells, so case and internal
/// whitespace differences don't defeat recognition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HeaderSignature {
    pub cells: Vec<String>,
}

impl HeaderSignature {
    pub fn new<I, S>(cells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cells: cells.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, row: &[String]) -> bool {
        row.len() == self.cells.len()
            && self
                .cells
                .iter()
                .zip(row.iter())
                .all(|(sig, cell)| normalize_cell(sig) == normalize_cell(cell))
    }
}

/// How to reconstruct logical tables from page-ordered raw rows. Passed as
/// data into the segmentation engine; the engine never calls back into the
/// document-type collaborator that chose it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum SegmentationStrategyConfig {
    /// One logical table per page table, rows copied verbatim. For documents
    /// without a recognized structure.
    Passthrough,

    /// Route rows to domains by the numeric value in `value_column`.
    ScoreDomain {
        domains: Vec<ScoreDomain>,
        #[serde(default)]
        value_column: usize,
        /// Require declared domains to be pairwise disjoint. When false,
        /// overlapping intervals are legal and resolved by declaration order
        /// (first matching domain wins); upstream domain sets are known to
        /// overlap, e.g. 0-19 next to 15-40.
        #[serde(default)]
        disjoint: bool,
    },

    /// Stitch roster-style tables back together by recognizing the header
    /// row that reappears after a page break.
    HeaderRepetition {
        signature: HeaderSignature,
        /// Optional regexes a section-title candidate must match, on top of
        /// the shape check (exactly one non-empty cell). Empty = shape only.
        #[serde(default)]
        section_title_patterns: Vec<String>,
    },
}

impl SegmentationStrategyConfig {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Passthrough => "passthrough",
            Self::ScoreDomain { .. } => "score_domain",
            Self::HeaderRepetition { .. } => "header_repetition",
        }
    }

    /// Fail-fast configuration check, run before any row is read.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Passthrough => Ok(()),
            Self::ScoreDomain {
                domains, disjoint, ..
            } => {
                if domains.is_empty() {
                    return Err(ConfigError::NoDomains);
                }
                for domain in domains {
                    if !domain.is_well_formed() {
                        return Err(ConfigError::IllFormedDomain {
                            name: domain.name.clone(),
                            min: domain.min,
                            max: domain.max,
                        });
                    }
                }
                if *disjoint {
                    for (i, first) in domains.iter().enumerate() {
                        for second in &domains[i + 1..] {
                            if let Some((lo, hi)) = first.overlap(second) {
                                return Err(ConfigError::OverlappingDomains {
                                    first: first.name.clone(),
                                    second: second.name.clone(),
                                    lo,
                                    hi,
                                });
                            }
                        }
                    }
                }
                Ok(())
            }
            Self::HeaderRepetition {
                signature,
                section_title_patterns,
            } => {
                if signature.cells.is_empty() {
                    return Err(ConfigError::EmptySignature);
                }
                compile_title_patterns(section_title_patterns)?;
                Ok(())
            }
        }
    }
}

/// Compile section-title regexes, surfacing the first bad pattern as a
/// configuration error.
pub(crate) fn compile_title_patterns(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::BadTitlePattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}

/// Everything one conversion job needs, constructed once at the job boundary
/// and threaded through calls, never process-wide state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub strategy: SegmentationStrategyConfig,
    /// Tolerance for percent-total and cross-column coherence checks
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_true")]
    pub validation_enabled: bool,
}

impl JobConfig {
    pub fn new(strategy: SegmentationStrategyConfig) -> Self {
        Self {
            strategy,
            tolerance: default_tolerance(),
            validation_enabled: true,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tolerance < 0.0 {
            return Err(ConfigError::NegativeTolerance(self.tolerance));
        }
        self.strategy.validate()
    }

    /// Load config from file path (functional approach)
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: JobConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|_| {
                eprintln!("⚠️  Failed to load config from {p}, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self::new(SegmentationStrategyConfig::Passthrough)
    }
}
