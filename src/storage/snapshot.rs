//! Snapshot model and the repository abstraction.
//!
//! A snapshot is one row of counter history: a unix timestamp plus the value
//! of every tracked counter at that moment. Rows are append-only and ordered
//! by timestamp; the two access patterns are "latest row" (startup seeding)
//! and "all rows ascending" (history display).

use std::path::Path;
use std::path::PathBuf;

#[cfg(test)]
use mockall::automock;
use serde::Deserialize;
use serde::Serialize;

use crate::CounterValues;
use crate::Result;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Seconds since the unix epoch (UTC)
    pub timestamp: u64,
    pub values: CounterValues,
}

impl Snapshot {
    pub fn new(
        timestamp: u64,
        values: CounterValues,
    ) -> Self {
        Self { timestamp, values }
    }

    /// The empty-storage baseline: timestamp 0 and every column at zero.
    pub fn zero<S: AsRef<str>>(columns: &[S]) -> Self {
        Self {
            timestamp: 0,
            values: columns.iter().map(|c| (c.as_ref().to_string(), 0)).collect(),
        }
    }

    /// Value of one counter; columns absent from the row read as zero.
    pub fn value(
        &self,
        name: &str,
    ) -> u64 {
        self.values.get(name).copied().unwrap_or(0)
    }

    pub fn is_zero(&self) -> bool {
        self.values.values().all(|v| *v == 0)
    }
}

/// Durable, append-only storage of counter snapshots.
///
/// Implementations must treat "no rows yet" as the zero snapshot rather
/// than an error, and must never rewrite or delete rows.
#[cfg_attr(test, automock)]
pub trait SnapshotRepository: Send + Sync + 'static {
    /// Most recent snapshot by timestamp, or [`Snapshot::zero`] when empty.
    fn load_latest(&self) -> Result<Snapshot>;

    fn append(
        &self,
        snapshot: &Snapshot,
    ) -> Result<()>;

    /// Every snapshot, ascending by timestamp.
    fn history(&self) -> Result<Vec<Snapshot>>;

    /// Snapshots with `timestamp >= since`, ascending.
    fn history_since(
        &self,
        since: u64,
    ) -> Result<Vec<Snapshot>>;

    /// Writes today's compacted copy into `dir`, replacing any copy taken
    /// earlier the same UTC day. Returns the artifact path.
    fn backup_into(
        &self,
        dir: &Path,
    ) -> Result<PathBuf>;

    fn flush(&self) -> Result<()>;
}
