use std::fs;
use std::path::Path;

use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};

use crate::monitor::{RankedSummary, SummaryRow};

/// One ranked process as written to an export file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub pid: u32,
    pub name: String,
    pub read_mb: f64,
    pub write_mb: f64,
    pub total_mb: f64,
}

impl From<&SummaryRow> for ExportRecord {
    fn from(row: &SummaryRow) -> Self {
        Self {
            pid: row.identity.pid,
            name: row.identity.name.clone(),
            read_mb: row.read_mb(),
            write_mb: row.write_mb(),
            total_mb: row.total_mb(),
        }
    }
}

pub fn export_records(summary: &RankedSummary) -> Vec<ExportRecord> {
    summary.rows.iter().map(ExportRecord::from).collect()
}

/// Write the ranking to `path` as a pretty-printed JSON array in rank order.
/// Returns the number of records written.
pub fn export_json(summary: &RankedSummary, path: &Path) -> Result<usize> {
    if summary.is_empty() {
        return Err(eyre!("no data to export"));
    }

    let records = export_records(summary);
    let json = serde_json::to_string_pretty(&records)?;

    ensure_parent_dir(path)?;
    fs::write(path, json).wrap_err_with(|| format!("failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), records = records.len(), "exported ranking");
    Ok(records.len())
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{AccountingMode, ProcessIdentity};

    fn summary() -> RankedSummary {
        RankedSummary {
            rows: vec![
                SummaryRow {
                    identity: ProcessIdentity::new(300, "rsync"),
                    read_bytes: 2 * 1024 * 1024,
                    write_bytes: 1024 * 1024,
                    total_bytes: 3 * 1024 * 1024,
                },
                SummaryRow {
                    identity: ProcessIdentity::new(12, "journald"),
                    read_bytes: 0,
                    write_bytes: 512 * 1024,
                    total_bytes: 512 * 1024,
                },
            ],
            samples: 10,
            observed: 2,
            mode: AccountingMode::Delta,
            partial: false,
        }
    }

    #[test]
    fn writes_one_record_per_row_in_rank_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("usage.json");

        let written = export_json(&summary(), &path).unwrap();
        assert_eq!(written, 2);

        let contents = fs::read_to_string(&path).unwrap();
        let records: Vec<ExportRecord> = serde_json::from_str(&contents).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].pid, 300);
        assert_eq!(records[0].name, "rsync");
        assert!((records[0].total_mb - 3.0).abs() < f64::EPSILON);
        assert_eq!(records[1].pid, 12);
        assert!((records[1].write_mb - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn record_fields_are_named_for_consumers() {
        let value = serde_json::to_value(export_records(&summary())).unwrap();
        let first = &value[0];
        for key in ["pid", "name", "read_mb", "write_mb", "total_mb"] {
            assert!(first.get(key).is_some(), "missing {key}");
        }
    }

    #[test]
    fn empty_summary_is_not_exported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");
        let err = export_json(&RankedSummary::empty(AccountingMode::Delta), &path).unwrap_err();
        assert!(err.to_string().contains("no data"));
        assert!(!path.exists());
    }

    #[test]
    fn failed_write_leaves_summary_reusable() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let summary = summary();

        assert!(export_json(&summary, &blocker.join("out.json")).is_err());
        let retry = dir.path().join("out.json");
        assert_eq!(export_json(&summary, &retry).unwrap(), 2);
    }
}
