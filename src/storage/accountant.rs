//! Disk space accounting.
//!
//! Provides used/free snapshots for any root using the fs2 crate. Every call
//! re-stats the filesystem; nothing is cached, so two consecutive snapshots of
//! a live volume may differ.

use std::io;
use std::path::Path;

use fs2::statvfs;
use serde::Serialize;

use super::StorageError;

/// Raw block statistics of the filesystem containing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockStats {
    /// Total number of blocks on the filesystem
    pub total_blocks: u64,
    /// Blocks available to unprivileged users
    pub available_blocks: u64,
    /// Size of one block in bytes
    pub block_size: u64,
}

/// Source of filesystem block statistics.
pub trait StatProvider {
    /// Stat the filesystem that contains `path`.
    fn stat(&self, path: &Path) -> io::Result<BlockStats>;
}

/// `StatProvider` backed by `statvfs` (or `GetDiskFreeSpaceEx` on Windows).
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStatProvider;

impl StatProvider for FsStatProvider {
    fn stat(&self, path: &Path) -> io::Result<BlockStats> {
        let stats = statvfs(path)?;

        // fs2 reports byte totals; on Unix they are f_frsize multiples, so
        // dividing by the granularity recovers the block counts exactly.
        let block_size = stats.allocation_granularity().max(1);
        Ok(BlockStats {
            total_blocks: stats.total_space() / block_size,
            available_blocks: stats.available_space() / block_size,
            block_size,
        })
    }
}

/// Point-in-time used/free reading for one root.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StorageSnapshot {
    total_bytes: u64,
    used_bytes: u64,
    free_bytes: u64,
    used_percent: f64,
    free_percent: f64,
}

impl StorageSnapshot {
    /// Derive a snapshot from raw block statistics.
    pub fn from_blocks(stats: BlockStats) -> Self {
        let total = stats.total_blocks.saturating_mul(stats.block_size);
        let free = stats.available_blocks.saturating_mul(stats.block_size).min(total);
        let used = total - free;

        let (used_percent, free_percent) = if total > 0 {
            let used_percent = used as f64 * 100.0 / total as f64;
            (used_percent, 100.0 - used_percent)
        } else {
            (0.0, 0.0)
        };

        Self {
            total_bytes: total,
            used_bytes: used,
            free_bytes: free,
            used_percent,
            free_percent,
        }
    }

    /// The all-zero snapshot shown when nothing could be measured.
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn used_bytes(&self) -> u64 {
        self.used_bytes
    }

    pub fn free_bytes(&self) -> u64 {
        self.free_bytes
    }

    /// Used share of the total (0.0 to 100.0).
    pub fn used_percent(&self) -> f64 {
        self.used_percent
    }

    /// Free share of the total (0.0 to 100.0).
    pub fn free_percent(&self) -> f64 {
        self.free_percent
    }

    /// A zero-sized filesystem carries no usable data; the 0 % figures are
    /// placeholders, not a real reading.
    pub fn has_data(&self) -> bool {
        self.total_bytes > 0
    }
}

/// Take a fresh snapshot of the filesystem containing `root`.
pub fn snapshot<S: StatProvider + ?Sized>(
    provider: &S,
    root: &Path,
) -> Result<StorageSnapshot, StorageError> {
    let stats = provider.stat(root).map_err(|source| StorageError::StatFailure {
        path: root.to_path_buf(),
        source,
    })?;

    Ok(StorageSnapshot::from_blocks(stats))
}

/// Outcome of the last refresh of a reading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ReadingStatus {
    /// The snapshot holds real figures
    Ok,
    /// Nothing to measure (no volume, or a zero-sized filesystem)
    NoData,
    /// The stat call failed; the snapshot is the zero placeholder
    Failed(String),
}

/// What the UI renders for one chart: always a snapshot, plus how it was obtained.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    pub snapshot: StorageSnapshot,
    pub status: ReadingStatus,
}

impl Reading {
    /// Wrap a snapshot result, substituting the zero snapshot on failure.
    pub fn from_result(result: &Result<StorageSnapshot, StorageError>) -> Self {
        match result {
            Ok(snapshot) if snapshot.has_data() => Self {
                snapshot: *snapshot,
                status: ReadingStatus::Ok,
            },
            Ok(_) => Self::no_data(),
            Err(e) => Self::failed(e.to_string()),
        }
    }

    pub fn no_data() -> Self {
        Self {
            snapshot: StorageSnapshot::zero(),
            status: ReadingStatus::NoData,
        }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        Self {
            snapshot: StorageSnapshot::zero(),
            status: ReadingStatus::Failed(reason.into()),
        }
    }

    pub fn has_data(&self) -> bool {
        self.status == ReadingStatus::Ok
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ReadingStatus::Failed(_))
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::no_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::env;

    struct FixedStats {
        result: Option<BlockStats>,
        calls: Cell<usize>,
    }

    impl StatProvider for FixedStats {
        fn stat(&self, _path: &Path) -> io::Result<BlockStats> {
            self.calls.set(self.calls.get() + 1);
            self.result
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "gone"))
        }
    }

    fn fixed(total_blocks: u64, available_blocks: u64, block_size: u64) -> FixedStats {
        FixedStats {
            result: Some(BlockStats {
                total_blocks,
                available_blocks,
                block_size,
            }),
            calls: Cell::new(0),
        }
    }

    #[test]
    fn test_data_partition_example() {
        let provider = fixed(1000, 400, 4096);
        let snap = snapshot(&provider, Path::new("/data")).expect("stat should succeed");

        assert_eq!(snap.total_bytes(), 4_096_000);
        assert_eq!(snap.used_bytes(), 2_457_600);
        assert_eq!(snap.free_bytes(), 1_638_400);
        assert!((snap.used_percent() - 60.0).abs() < 1e-9);
        assert!((snap.free_percent() - 40.0).abs() < 1e-9);
        assert!(snap.has_data());
    }

    #[test]
    fn test_used_plus_free_is_total() {
        for &(total, avail, bs) in &[
            (1u64, 0u64, 512u64),
            (1, 1, 512),
            (7, 3, 4096),
            (1_000_000, 999_999, 1024),
            (123_456_789, 42, 65536),
        ] {
            let snap = StorageSnapshot::from_blocks(BlockStats {
                total_blocks: total,
                available_blocks: avail,
                block_size: bs,
            });
            assert_eq!(snap.used_bytes() + snap.free_bytes(), total * bs);
            assert!((snap.used_percent() + snap.free_percent() - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_zero_total_has_no_data() {
        let snap = StorageSnapshot::from_blocks(BlockStats {
            total_blocks: 0,
            available_blocks: 0,
            block_size: 4096,
        });
        assert_eq!(snap.used_percent(), 0.0);
        assert_eq!(snap.free_percent(), 0.0);
        assert!(!snap.has_data());

        let reading = Reading::from_result(&Ok(snap));
        assert_eq!(reading.status, ReadingStatus::NoData);
    }

    #[test]
    fn test_available_above_total_is_clamped() {
        let snap = StorageSnapshot::from_blocks(BlockStats {
            total_blocks: 10,
            available_blocks: 12,
            block_size: 1,
        });
        assert_eq!(snap.free_bytes(), 10);
        assert_eq!(snap.used_bytes(), 0);
    }

    #[test]
    fn test_stat_failure_becomes_failed_reading() {
        let provider = FixedStats {
            result: None,
            calls: Cell::new(0),
        };
        let result = snapshot(&provider, Path::new("/media/gone"));
        assert!(matches!(result, Err(StorageError::StatFailure { .. })));

        let reading = Reading::from_result(&result);
        assert!(reading.is_failed());
        assert_eq!(reading.snapshot, StorageSnapshot::zero());
    }

    #[test]
    fn test_every_call_restats() {
        let provider = fixed(10, 5, 1);
        let _ = snapshot(&provider, Path::new("/"));
        let _ = snapshot(&provider, Path::new("/"));
        assert_eq!(provider.calls.get(), 2);
    }

    #[test]
    fn test_fs_provider_current_dir() {
        let current_dir = env::current_dir().expect("Failed to get current directory");
        let snap = snapshot(&FsStatProvider, &current_dir).expect("stat current dir");

        assert!(snap.total_bytes() > 0, "Total space should be greater than 0");
        assert!(snap.free_bytes() <= snap.total_bytes());
        assert_eq!(snap.used_bytes() + snap.free_bytes(), snap.total_bytes());
    }

    #[test]
    fn test_fs_provider_nonexistent() {
        let result = snapshot(
            &FsStatProvider,
            Path::new("/this/path/definitely/does/not/exist/xyz123"),
        );
        assert!(result.is_err(), "Should fail for nonexistent path");
    }
}
