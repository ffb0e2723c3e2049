use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use crate::CounterValues;
use crate::SledSnapshotRepository;
use crate::TallyConfig;

static LOGGER_INIT: once_cell::sync::Lazy<()> = once_cell::sync::Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

pub fn enable_logger() {
    *LOGGER_INIT;
    println!("setup logger for unit test.");
}

/// Builds a `CounterValues` from literal pairs.
pub fn counter_values(pairs: &[(&str, u64)]) -> CounterValues {
    pairs.iter().map(|(name, value)| (name.to_string(), *value)).collect()
}

/// Config rooted in `dir` with both schedulers disabled.
pub fn test_config(dir: &Path) -> TallyConfig {
    let mut config = TallyConfig::default();
    config.storage.db_path = dir.join("tally.db");
    config.storage.backup_dir = dir.join("backups");
    config.log_dir = dir.join("logs");
    config.counters = vec!["A".into(), "B".into()];
    config
}

/// A fresh sled repository in its own temp directory. Keep the `TempDir`
/// alive for as long as the repository is used.
pub fn temp_repository(counters: &[&str]) -> (TempDir, Arc<SledSnapshotRepository>) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let counters: Vec<String> = counters.iter().map(|c| c.to_string()).collect();
    let repository = SledSnapshotRepository::open(dir.path().join("tally.db"), &counters).expect("open repository");
    (dir, Arc::new(repository))
}
