// Main segmentation module - delegates to per-strategy sub-modules
// This file coordinates the strategies but actual implementations are in:
// - engine.rs: SegmentationEngine dispatch + passthrough strategy
// - score_domain.rs: numeric score-domain routing
// - header_repetition.rs: repeated-header stitching for roster tables

pub mod engine;
pub mod header_repetition;
pub mod score_domain;

// Re-export the entry point
pub use engine::SegmentationEngine;
