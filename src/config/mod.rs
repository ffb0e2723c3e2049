//! Configuration for the counter service.
//!
//! Loaded hierarchically, later sources overriding earlier ones:
//! - Type defaults
//! - File named by `CONFIG_PATH`
//! - Environment variables prefixed `TALLY__` (`__` separates sections)
//!
//! ```toml
//! counters = ["A", "B", "views"]
//! log_dir = "logs"
//!
//! [storage]
//! db_path = "data/tally.db"
//! backup_dir = "data/backups"
//!
//! [scheduler]
//! snapshot_interval_in_ms = "10s"
//! broadcast_interval_in_ms = 500
//!
//! [broadcast]
//! subscriber_queue_capacity = 100
//! ```
mod broadcast;
mod scheduler;
mod storage;
pub use broadcast::*;
pub use scheduler::*;
pub use storage::*;


use std::env;
use std::path::Path;
use std::path::PathBuf;

use config::Config;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

const ENV_PREFIX: &str = "TALLY";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TallyConfig {
    /// Snapshot database and backup locations
    #[serde(default)]
    pub storage: StorageConfig,
    /// Snapshot and broadcast intervals
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Subscriber queue sizing
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Log files output directory
    ///
    /// Default: `default_log_dir()` (./logs)
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    /// Names of the tracked counters. Fixed for the life of the process.
    ///
    /// Default: `["A", "B", "views"]`
    #[serde(default = "default_counters")]
    pub counters: Vec<String>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            scheduler: SchedulerConfig::default(),
            broadcast: BroadcastConfig::default(),
            log_dir: default_log_dir(),
            counters: default_counters(),
        }
    }
}

impl TallyConfig {
    /// Loads configuration from defaults, `CONFIG_PATH` and the environment.
    ///
    /// Not validated: call [`TallyConfig::validate`] once all overrides are applied.
    ///
    /// ```ignore
    /// let cfg = TallyConfig::new()?.validate()?;
    ///
    /// let cfg = TallyConfig::new()?
    ///     .with_override_config("custom.toml")?
    ///     .validate()?;
    /// ```
    pub fn new() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if let Ok(config_path) = env::var("CONFIG_PATH") {
            builder = builder.add_source(File::with_name(&config_path).required(true));
        }

        builder = builder.add_source(environment());

        let config: Self = builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Layers another config file over the current values. Environment
    /// variables still win.
    pub fn with_override_config(
        &self,
        path: &str,
    ) -> Result<Self> {
        let mut config: Self = Config::builder()
            .add_source(Config::try_from(self)?)
            .add_source(File::with_name(path))
            .add_source(environment())
            .build()?
            .try_deserialize()?;
        config.scheduler.carry_rejected(&self.scheduler);
        Ok(config)
    }

    /// Consumes self and returns it if every section is valid.
    ///
    /// Tolerated problems such as unparseable intervals are logged here, so
    /// call it after logging is initialized.
    pub fn validate(self) -> Result<Self> {
        if self.counters.is_empty() {
            return Err(Error::Config(ConfigError::Message(
                "counters must contain at least one name".into(),
            )));
        }
        if let Some(name) = self.counters.iter().find(|c| c.trim().is_empty()) {
            return Err(Error::Config(ConfigError::Message(format!(
                "counter name {name:?} is blank"
            ))));
        }

        validate_path(&self.log_dir, "log_dir")?;
        self.storage.validate()?;
        self.scheduler.validate()?;
        self.broadcast.validate()?;
        Ok(self)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .ignore_empty(true)
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("counters")
}

/// Rejects empty paths. Directories are created lazily by the components
/// that write into them.
pub(super) fn validate_path(
    path: &Path,
    name: &str,
) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(Error::Config(ConfigError::Message(format!(
            "{name} path cannot be empty"
        ))));
    }
    Ok(())
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("./logs")
}

fn default_counters() -> Vec<String> {
    vec!["A".into(), "B".into(), "views".into()]
}
