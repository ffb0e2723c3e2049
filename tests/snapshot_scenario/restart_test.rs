use tally::App;
use tally::TallyConfig;
use tempfile::tempdir;

use crate::common::backup_artifacts;
use crate::common::config_in;

fn with_snapshots(mut config: TallyConfig) -> TallyConfig {
    config.scheduler.snapshot_interval_in_ms = 3_600_000;
    config
}

/// # Case 2: counters survive a restart
///
/// ## Criterias:
/// 1. the first run persists its final values on shutdown
/// 2. the second run resumes from them and writes no duplicate row
/// 3. the second run backs the database up, once per day
#[tokio::test]
async fn test_restart_resumes_from_latest_snapshot() {
    crate::enable_logger();
    let temp_dir = tempdir().unwrap();
    let config = with_snapshots(config_in(temp_dir.path()));

    // First run
    let app = App::start(config.clone()).await.unwrap();
    let a = app.counter_id("A").unwrap();
    for _ in 0..3 {
        app.increment(a);
    }
    app.shutdown().await.unwrap();
    assert!(backup_artifacts(&config.storage.backup_dir).is_empty());

    // Second run
    let app = App::start(config.clone()).await.unwrap();
    let a = app.counter_id("A").unwrap();
    assert_eq!(app.load(a), 3);
    assert_eq!(app.history().unwrap().len(), 1);
    assert_eq!(backup_artifacts(&config.storage.backup_dir).len(), 1);
    app.shutdown().await.unwrap();

    // Unchanged run leaves the history alone
    let app = App::start(config.clone()).await.unwrap();
    assert_eq!(app.history().unwrap().len(), 1);
    assert_eq!(backup_artifacts(&config.storage.backup_dir).len(), 1);
    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_new_counter_added_between_runs() {
    let temp_dir = tempdir().unwrap();
    let mut config = with_snapshots(config_in(temp_dir.path()));
    config.counters = vec!["A".into()];

    let app = App::start(config.clone()).await.unwrap();
    app.increment(app.counter_id("A").unwrap());
    app.shutdown().await.unwrap();

    config.counters.push("B".into());
    let app = App::start(config).await.unwrap();

    let latest = app.latest_snapshot().unwrap();
    assert_eq!(latest.value("A"), 1);
    assert_eq!(latest.value("B"), 0);
    assert_eq!(app.load(app.counter_id("B").unwrap()), 0);

    app.shutdown().await.unwrap();
}
