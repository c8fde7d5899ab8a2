use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type TableId = Uuid;

/// Label of the synthetic quarantine table that collects rows no strategy
/// could attribute to a domain or section.
pub const UNCLASSIFIED_LABEL: &str = "Unclassified";

// ===== EXTRACTION-SIDE TYPES =====
// These arrive from the extraction collaborator and are read-only from then
// on. `row_index` is assigned per page and keeps counting across table
// regions on the same page, so `(page, row_index)` identifies a row globally.

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRow {
    /// Cell values as extracted, typed as strings; numeric meaning is
    /// recovered lazily via [`parse_number`].
    pub cells: Vec<String>,
    /// Page number (1-indexed)
    pub page: u32,
    /// Row index within the page (0-indexed)
    pub row_index: u32,
    /// Identifier of the physically detected table region this row came from
    pub source_table: String,
}

impl RawRow {
    pub fn provenance(&self) -> RowProvenance {
        RowProvenance {
            page: self.page,
            row_index: self.row_index,
        }
    }
}

/// The unmodified, page-scoped view of extracted rows. One per physically
/// detected table region; never reordered or merged. This is the
/// traceability view the output writers may render verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageTable {
    /// Page number (1-indexed)
    pub page: u32,
    pub rows: Vec<RawRow>,
    /// `row_index` values extraction flagged as header rows
    #[serde(default)]
    pub header_rows: Vec<u32>,
}

impl PageTable {
    pub fn new(page: u32, rows: Vec<RawRow>) -> Self {
        Self {
            page,
            rows,
            header_rows: Vec::new(),
        }
    }

    pub fn is_header_row(&self, row_index: u32) -> bool {
        self.header_rows.contains(&row_index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

// ===== RECONSTRUCTION-SIDE TYPES =====

/// Reference from a reconstructed row back to its position in the original
/// page tables. This is the audit trail: every logical row must stay
/// resolvable to a source location, whatever the segmentation did.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowProvenance {
    pub page: u32,
    pub row_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogicalRow {
    pub cells: Vec<String>,
    pub provenance: RowProvenance,
}

/// How a logical table was formed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TableKind {
    /// Rows routed by a numeric score domain
    Domain,
    /// Rows grouped under a recognized (possibly repeated) header
    Section,
    /// Verbatim copy of one page table, no reconstruction
    Passthrough,
    /// Quarantine for rows no strategy could attribute
    Unclassified,
}

/// A reconstructed table grouping rows by domain/section semantics,
/// independent of where physical page breaks fell. Created exactly once per
/// conversion job and read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogicalTable {
    pub id: TableId,
    /// Human-readable label: section title or domain descriptor
    pub label: String,
    pub kind: TableKind,
    /// Domain metadata for score-routed tables
    pub domain: Option<ScoreDomain>,
    /// Header cell pattern, when one was recognized. Metadata, not a data row.
    pub header: Option<Vec<String>>,
    pub rows: Vec<LogicalRow>,
}

impl LogicalTable {
    pub fn new(label: impl Into<String>, kind: TableKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.into(),
            kind,
            domain: None,
            header: None,
            rows: Vec::new(),
        }
    }

    pub fn unclassified() -> Self {
        Self::new(UNCLASSIFIED_LABEL, TableKind::Unclassified)
    }

    pub fn push_row(&mut self, row: &RawRow) {
        self.rows.push(LogicalRow {
            cells: row.cells.clone(),
            provenance: row.provenance(),
        });
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Resolve a named column against the header (case-insensitive substring
    /// match, first hit wins).
    pub fn column_by_name(&self, name: &str) -> Option<usize> {
        let needle = name.to_lowercase();
        self.header
            .as_ref()?
            .iter()
            .position(|h| h.to_lowercase().contains(&needle))
    }
}

/// Output pair of the segmentation engine: the untouched page view next to
/// the reconstructed logical view, plus any issues the segmentation pass
/// itself detected (these are folded into the validation report later).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentedTables {
    pub page_tables: Vec<PageTable>,
    pub logical_tables: Vec<LogicalTable>,
    #[serde(default)]
    pub issues: Vec<ValidationIssue>,
}

impl SegmentedTables {
    /// Look a logical row's provenance back up in the page tables.
    pub fn resolve(&self, provenance: RowProvenance) -> Option<&RawRow> {
        self.page_tables
            .iter()
            .filter(|p| p.page == provenance.page)
            .flat_map(|p| p.rows.iter())
            .find(|r| r.row_index == provenance.row_index)
    }

    pub fn input_row_count(&self) -> usize {
        self.page_tables.iter().map(|p| p.rows.len()).sum()
    }

    pub fn logical_row_count(&self) -> usize {
        self.logical_tables.iter().map(|t| t.rows.len()).sum()
    }
}

// ===== SCORE DOMAINS =====

/// A closed numeric interval routing rows of a statistical distribution to
/// the correct logical table. Doubles as the domain metadata attached to the
/// resulting table, which is why it lives here and not in `config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreDomain {
    /// e.g. "Scaled Objective", "Scaled Essay"
    pub name: String,
    pub min: f64,
    pub max: f64,
    #[serde(default)]
    pub description: String,
}

impl ScoreDomain {
    pub fn new(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            min,
            max,
            description: String::new(),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    pub fn is_well_formed(&self) -> bool {
        self.min <= self.max
    }

    /// Intersection with another domain, if any. Used by overlap detection.
    pub fn overlap(&self, other: &ScoreDomain) -> Option<(f64, f64)> {
        let lo = self.min.max(other.min);
        let hi = self.max.min(other.max);
        (lo <= hi).then_some((lo, hi))
    }
}

// ===== VALIDATION TYPES =====

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationIssue {
    pub rule_id: String,
    pub severity: Severity,
    pub table_id: TableId,
    /// Provenance of the offending rows; empty for table-level findings
    pub rows: Vec<RowProvenance>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableVerdict {
    pub table_id: TableId,
    pub label: String,
    /// true iff zero error-severity issues were raised for this table.
    /// Warnings never affect it.
    pub passed: bool,
}

/// Immutable result of one validation pass. Issues are stably sorted by
/// (table id, rule id, first row provenance), so two passes over identical
/// logical tables serialize byte-identically. Deliberately carries no
/// timestamp; that belongs to [`JobMetadata`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
    /// One verdict per validated table, in input order
    pub verdicts: Vec<TableVerdict>,
}

impl ValidationReport {
    pub fn passed(&self) -> bool {
        self.verdicts.iter().all(|v| v.passed)
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .count()
    }

    pub fn issues_for(&self, table_id: TableId) -> Vec<&ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.table_id == table_id)
            .collect()
    }
}

// ===== JOB METADATA =====

/// Per-job audit record handed to the external audit collaborator alongside
/// the tables and the report. One per conversion job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobMetadata {
    /// Name of the strategy variant that ran
    pub strategy: String,
    /// SHA-256 over the serialized strategy configuration
    pub strategy_hash: String,
    /// SHA-256 over the input page tables
    pub input_fingerprint: String,
    pub page_count: usize,
    pub input_row_count: usize,
    pub logical_table_count: usize,
    pub processed_at: DateTime<Utc>,
}

// ===== CELL COERCION HELPERS =====

/// Lazy numeric coercion for cell values. Extraction keeps everything as
/// strings; thousands separators, percent signs and stray whitespace are
/// stripped before parsing. Returns None for anything non-numeric.
pub fn parse_number(cell: &str) -> Option<f64> {
    let cleaned: String = cell
        .chars()
        .filter(|c| *c != ',' && *c != '%' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a cell for comparisons: collapse internal whitespace, uppercase.
pub fn normalize_cell(cell: &str) -> String {
    cell.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}
