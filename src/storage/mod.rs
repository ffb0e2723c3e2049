mod backup;
mod sled_snapshot_repository;
mod snapshot;


use std::path::Path;

#[doc(hidden)]
pub use backup::*;
#[doc(hidden)]
pub use sled_snapshot_repository::*;
pub use snapshot::*;
use tracing::debug;
use tracing::warn;

use crate::Result;
use crate::StorageError;

/// Opens (or creates) the sled database holding counter snapshots.
pub fn init_sled_snapshot_db(
    sled_db_path: impl AsRef<Path> + std::fmt::Debug
) -> Result<sled::Db> {
    debug!("init_sled_snapshot_db from path: {:?}", &sled_db_path);

    let path = sled_db_path.as_ref();
    crate::file_io::create_parent_dir_if_not_exist(path)?;

    sled::Config::default()
        .path(path)
        .cache_capacity(10 * 1024 * 1024) //10MB
        .flush_every_ms(Some(500))
        .use_compression(true)
        .compression_factor(1)
        .open()
        .map_err(|e| {
            warn!("Try to open DB at this location: {:?} and failed: {:?}", path, e);
            StorageError::Sled(e).into()
        })
}
