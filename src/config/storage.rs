use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use super::validate_path;
use crate::Result;

/// Locations of persisted state.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StorageConfig {
    /// Snapshot database directory
    ///
    /// Default: `default_db_path()` (./data/tally.db)
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory receiving one `backup-YYYY-MM-DD` copy per UTC day
    ///
    /// Default: `default_backup_dir()` (./data/backups)
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            backup_dir: default_backup_dir(),
        }
    }
}

impl StorageConfig {
    pub fn validate(&self) -> Result<()> {
        validate_path(&self.db_path, "storage.db_path")?;
        validate_path(&self.backup_dir, "storage.backup_dir")?;
        Ok(())
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./data/tally.db")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("./data/backups")
}
