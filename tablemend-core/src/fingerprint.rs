use crate::types::PageTable;
use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};

// Fingerprints for the audit record: the external audit collaborator stores
// these next to the output so a converted file can be traced back to the
// exact input and configuration that produced it.

/// SHA-256 over the page tables' content: page numbers, row positions and
/// every cell, with separators so cell boundaries can't alias.
pub fn page_tables_fingerprint(page_tables: &[PageTable]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(page_tables.len().to_le_bytes());

    for page_table in page_tables {
        hasher.update(page_table.page.to_le_bytes());
        hasher.update(page_table.rows.len().to_le_bytes());
        for row in &page_table.rows {
            hasher.update(row.row_index.to_le_bytes());
            for cell in &row.cells {
                hasher.update(cell.as_bytes());
                hasher.update([0u8]);
            }
            hasher.update([1u8]);
        }
    }

    format!("{:x}", hasher.finalize())
}

/// Hash of any serializable configuration, via its canonical JSON bytes.
pub fn config_hash<T: serde::Serialize>(config: &T) -> Result<String> {
    let json = serde_json::to_string(config)
        .map_err(|e| anyhow!("Failed to serialize config for hashing: {}", e))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SegmentationStrategyConfig;
    use crate::types::RawRow;

    fn page(page: u32, cells: &[&str]) -> PageTable {
        PageTable::new(
            page,
            vec![RawRow {
                cells: cells.iter().map(|c| c.to_string()).collect(),
                page,
                row_index: 0,
                source_table: "t0".to_string(),
            }],
        )
    }

    #[test]
    fn test_fingerprint_consistency() {
        let pages = vec![page(1, &["a", "b"])];
        assert_eq!(page_tables_fingerprint(&pages), page_tables_fingerprint(&pages));
    }

    #[test]
    fn test_fingerprint_uniqueness() {
        let first = vec![page(1, &["a", "b"])];
        let second = vec![page(1, &["a", "c"])];
        assert_ne!(page_tables_fingerprint(&first), page_tables_fingerprint(&second));
    }

    #[test]
    fn test_cell_boundaries_do_not_alias() {
        let joined = vec![page(1, &["ab", ""])];
        let split = vec![page(1, &["a", "b"])];
        assert_ne!(page_tables_fingerprint(&joined), page_tables_fingerprint(&split));
    }

    #[test]
    fn test_config_hash_tracks_content() {
        let passthrough = SegmentationStrategyConfig::Passthrough;
        let hash1 = config_hash(&passthrough).unwrap();
        let hash2 = config_hash(&passthrough).unwrap();
        assert_eq!(hash1, hash2);
    }
}
