//! Daily compacted backups of the snapshot database.
//!
//! A backup is a fresh sled database holding a copy of every live entry of
//! the source. Copying into an empty database is what compacts it: segments
//! full of superseded pages are not carried over.
//!
//! The copy is built in a hidden temporary directory next to the target,
//! flushed, and only then renamed over `backup-YYYY-MM-DD`. A second backup on
//! the same UTC date therefore replaces the first; older dates are left
//! untouched and never pruned.

use std::path::Path;
use std::path::PathBuf;

use chrono::DateTime;
use chrono::Utc;
use sled::Batch;
use tracing::debug;
use tracing::info;

use crate::file_io::create_dir_if_not_exist;
use crate::file_io::remove_path_if_exists;
use crate::time::utc_date_stamp;
use crate::Result;
use crate::StorageError;

pub const BACKUP_PREFIX: &str = "backup-";

const COPY_BATCH_SIZE: usize = 1024;

/// Artifact path for the UTC date of `at`.
pub fn backup_path(
    dir: &Path,
    at: DateTime<Utc>,
) -> PathBuf {
    dir.join(format!("{}{}", BACKUP_PREFIX, utc_date_stamp(at)))
}

pub(crate) fn backup_db(
    db: &sled::Db,
    dir: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf> {
    create_dir_if_not_exist(dir)?;

    let final_path = backup_path(dir, at);
    let temp_path = dir.join(format!(".{}{}.tmp", BACKUP_PREFIX, utc_date_stamp(at)));

    // Leftover from an interrupted run
    remove_path_if_exists(&temp_path)?;

    let copied = copy_into(db, &temp_path).map_err(|e| {
        let _ = remove_path_if_exists(&temp_path);
        e
    })?;

    remove_path_if_exists(&final_path)?;
    std::fs::rename(&temp_path, &final_path).map_err(|e| {
        StorageError::Backup(format!(
            "rename {} -> {} failed: {}",
            temp_path.display(),
            final_path.display(),
            e
        ))
    })?;

    info!(path = %final_path.display(), entries = copied, "backup written");
    Ok(final_path)
}

/// Copies every tree of `db` into a new database at `path`; returns the
/// number of entries copied. The target is closed before returning.
fn copy_into(
    db: &sled::Db,
    path: &Path,
) -> Result<usize> {
    let target = sled::Config::default()
        .path(path)
        .use_compression(true)
        .compression_factor(1)
        .open()?;

    let mut copied = 0;
    for name in db.tree_names() {
        let source = db.open_tree(&name)?;
        let dest = target.open_tree(&name)?;

        let mut batch = Batch::default();
        let mut pending = 0;
        for item in source.iter() {
            let (key, value) = item?;
            batch.insert(key, value);
            pending += 1;
            if pending == COPY_BATCH_SIZE {
                dest.apply_batch(std::mem::take(&mut batch))?;
                copied += pending;
                pending = 0;
            }
        }
        if pending > 0 {
            dest.apply_batch(batch)?;
            copied += pending;
        }

        debug!(tree = %String::from_utf8_lossy(&name), "tree copied");
    }

    target.flush()?;
    drop(target);

    Ok(copied)
}
