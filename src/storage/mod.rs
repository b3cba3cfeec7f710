//! Storage accounting module.
//!
//! Turns raw filesystem block statistics into used/free snapshots for the
//! internal data volume and for the granted removable volume.

mod accountant;
mod units;

pub use accountant::{
    snapshot, BlockStats, FsStatProvider, Reading, ReadingStatus, StatProvider, StorageSnapshot,
};
pub use units::{format_percent, usage_line};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while querying filesystem statistics.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The stat call on a root failed
    #[error("failed to stat {path}: {source}")]
    StatFailure {
        /// The root that was queried
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
