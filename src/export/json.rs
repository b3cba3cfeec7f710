use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::storage::{Reading, ReadingStatus, StorageSnapshot};

/// One measured root in the report
#[derive(Debug, Serialize)]
pub struct TargetReport {
    pub root: PathBuf,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub snapshot: StorageSnapshot,
}

impl TargetReport {
    pub fn new(root: &Path, reading: &Reading) -> Self {
        let (status, reason) = match &reading.status {
            ReadingStatus::Ok => ("ok", None),
            ReadingStatus::NoData => ("no_data", None),
            ReadingStatus::Failed(reason) => ("failed", Some(reason.clone())),
        };
        Self {
            root: root.to_path_buf(),
            status,
            reason,
            snapshot: reading.snapshot,
        }
    }
}

/// Snapshot of both storages as printed by `--json`
#[derive(Debug, Serialize)]
pub struct StorageReport {
    pub generated_at: DateTime<Local>,
    pub internal: TargetReport,
    /// Absent when no removable volume is selected
    pub removable: Option<TargetReport>,
}

impl StorageReport {
    pub fn new(internal: TargetReport, removable: Option<TargetReport>) -> Self {
        Self {
            generated_at: Local::now(),
            internal,
            removable,
        }
    }
}

/// Write the report as pretty-printed JSON.
pub fn export_json(report: &StorageReport, writer: &mut impl Write) -> Result<(), std::io::Error> {
    serde_json::to_writer_pretty(&mut *writer, report)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
    writer.write_all(b"\n")
}
