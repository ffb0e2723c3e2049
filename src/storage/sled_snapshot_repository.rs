use std::fmt::Debug;
use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use sled::IVec;
use sled::Tree;
use tracing::debug;
use tracing::info;
use tracing::instrument;
use tracing::trace;
use tracing::warn;

use super::backup_db;
use super::init_sled_snapshot_db;
use super::Snapshot;
use super::SnapshotRepository;
use crate::Result;
use crate::StorageError;

/// Append-only table of counter rows.
pub const SNAPSHOT_TREE: &str = "counter_snapshots";
/// Holds the ordered column list of [`SNAPSHOT_TREE`].
pub const SCHEMA_TREE: &str = "schema";

const COLUMNS_KEY: &[u8] = b"columns";
const KEY_LEN: usize = 16;

/// sled-backed [`SnapshotRepository`].
///
/// Layout:
/// - `counter_snapshots`: key = big-endian `ts` ++ big-endian `seq`,
///   value = bincode `Vec<u64>` in schema column order
/// - `schema`: `columns` → bincode `Vec<String>`
///
/// The sequence comes from `Db::generate_id`, so rows sharing a timestamp
/// keep their insertion order and the last key is always the latest row.
pub struct SledSnapshotRepository {
    db: sled::Db,
    snapshots: Tree,
    columns: Vec<String>,
}

impl Debug for SledSnapshotRepository {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("SledSnapshotRepository")
            .field("columns", &self.columns)
            .field("rows", &self.snapshots.len())
            .finish()
    }
}

impl SledSnapshotRepository {
    /// Opens the database at `path` and applies the schema for `counters`.
    pub fn open(
        path: impl AsRef<Path> + Debug,
        counters: &[String],
    ) -> Result<Self> {
        let db = init_sled_snapshot_db(path)?;
        Self::with_db(db, counters)
    }

    /// Applies the schema on an already opened database.
    pub fn with_db(
        db: sled::Db,
        counters: &[String],
    ) -> Result<Self> {
        let schema = db.open_tree(SCHEMA_TREE)?;
        let columns = apply_schema(&schema, counters)?;
        let snapshots = db.open_tree(SNAPSHOT_TREE)?;

        info!(?columns, rows = snapshots.len(), "snapshot repository ready");

        Ok(Self {
            db,
            snapshots,
            columns,
        })
    }

    /// Column order of stored rows. Never shrinks.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Same as [`SnapshotRepository::backup_into`] with an explicit clock.
    pub fn backup_into_at(
        &self,
        dir: &Path,
        at: DateTime<Utc>,
    ) -> Result<PathBuf> {
        backup_db(&self.db, dir, at)
    }

    pub(crate) fn encode_key(
        timestamp: u64,
        seq: u64,
    ) -> [u8; KEY_LEN] {
        let mut key = [0u8; KEY_LEN];
        key[..8].copy_from_slice(&timestamp.to_be_bytes());
        key[8..].copy_from_slice(&seq.to_be_bytes());
        key
    }

    fn decode_timestamp(key: &[u8]) -> Result<u64> {
        if key.len() != KEY_LEN {
            return Err(StorageError::DataCorruption {
                location: format!("{SNAPSHOT_TREE} key of {} bytes", key.len()),
            }
            .into());
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&key[..8]);
        Ok(u64::from_be_bytes(ts))
    }

    fn decode_row(
        &self,
        key: &[u8],
        value: &[u8],
    ) -> Result<Snapshot> {
        let timestamp = Self::decode_timestamp(key)?;
        let row: Vec<u64> = bincode::deserialize(value)?;

        // Rows written before a column existed are shorter; those columns read as zero.
        let values = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), row.get(i).copied().unwrap_or(0)))
            .collect();

        Ok(Snapshot::new(timestamp, values))
    }

    fn collect_rows(
        &self,
        iter: impl Iterator<Item = sled::Result<(IVec, IVec)>>,
    ) -> Result<Vec<Snapshot>> {
        let mut rows = Vec::new();
        for item in iter {
            let (key, value) = item?;
            rows.push(self.decode_row(&key, &value)?);
        }
        Ok(rows)
    }
}

impl SnapshotRepository for SledSnapshotRepository {
    #[instrument(skip(self))]
    fn load_latest(&self) -> Result<Snapshot> {
        match self.snapshots.last()? {
            Some((key, value)) => self.decode_row(&key, &value),
            None => {
                debug!("no snapshot rows yet, starting from zero");
                Ok(Snapshot::zero(&self.columns))
            }
        }
    }

    fn append(
        &self,
        snapshot: &Snapshot,
    ) -> Result<()> {
        for name in snapshot.values.keys() {
            if !self.columns.contains(name) {
                warn!(counter = %name, "counter has no column, value not persisted");
            }
        }

        let row: Vec<u64> = self.columns.iter().map(|c| snapshot.value(c)).collect();
        let seq = self.db.generate_id()?;
        let key = Self::encode_key(snapshot.timestamp, seq);

        self.snapshots.insert(key, bincode::serialize(&row)?)?;

        trace!(timestamp = snapshot.timestamp, seq, ?row, "snapshot appended");
        Ok(())
    }

    fn history(&self) -> Result<Vec<Snapshot>> {
        self.collect_rows(self.snapshots.iter())
    }

    fn history_since(
        &self,
        since: u64,
    ) -> Result<Vec<Snapshot>> {
        let start = Self::encode_key(since, 0);
        self.collect_rows(self.snapshots.range(start..))
    }

    fn backup_into(
        &self,
        dir: &Path,
    ) -> Result<PathBuf> {
        self.backup_into_at(dir, Utc::now())
    }

    fn flush(&self) -> Result<()> {
        let bytes = self.db.flush()?;
        trace!(bytes, "snapshot db flushed");
        Ok(())
    }
}

/// Idempotently reconciles the stored column list with the configured
/// counters: existing columns keep their position, new counters are appended,
/// nothing is ever dropped.
pub(crate) fn apply_schema(
    schema: &Tree,
    counters: &[String],
) -> Result<Vec<String>> {
    let mut columns: Vec<String> = match schema.get(COLUMNS_KEY)? {
        Some(bytes) => bincode::deserialize(&bytes).map_err(|e| {
            StorageError::Schema(format!("stored column list is unreadable: {e}"))
        })?,
        None => Vec::new(),
    };

    let before = columns.len();
    for counter in counters {
        if counter.is_empty() {
            return Err(StorageError::Schema("counter name cannot be empty".into()).into());
        }
        if !columns.contains(counter) {
            columns.push(counter.clone());
        }
    }

    if columns.len() != before || before == 0 {
        schema.insert(COLUMNS_KEY, bincode::serialize(&columns)?)?;
        schema.flush()?;
        info!(added = columns.len() - before, ?columns, "snapshot schema applied");
    }

    Ok(columns)
}
