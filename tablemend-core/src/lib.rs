// Tablemend Core Library
//
// Reconstructs logical tables from page-fragmented extraction output and
// validates them against deterministic rules before anything is rendered.
// Main interface for turning page-ordered raw rows into audited tables.

pub mod classifier;
pub mod config;
pub mod fingerprint;
pub mod processor;
pub mod rules;
pub mod segmentation;
pub mod types;

// Re-export main types and functions for easy use
pub use types::*;
pub use classifier::{ClassifiedStrategy, StrategyClassifier};
pub use config::{ConfigError, HeaderSignature, JobConfig, SegmentationStrategyConfig};
pub use processor::{JobOutcome, TableProcessor};
pub use rules::{ColumnRef, Rule, RuleRegistry, RuleScope, ValidationEngine};
pub use segmentation::SegmentationEngine;
