use std::time::Duration;

use tally::App;
use tempfile::tempdir;

use crate::common::config_in;

/// # Case 1: change-triggered snapshots
///
/// ## Setup:
/// 1. empty storage, snapshot interval 200ms
///
/// ## Criterias:
/// 1. 4 increments of A → exactly one row with A = 4
/// 2. an idle interval writes no row
/// 3. one more increment → a second row with A = 5, timestamp not earlier
#[tokio::test(start_paused = true)]
async fn test_snapshot_rows_follow_counter_changes() {
    crate::enable_logger();
    let temp_dir = tempdir().unwrap();
    let mut config = config_in(temp_dir.path());
    config.scheduler.snapshot_interval_in_ms = 200;

    let app = App::start(config).await.unwrap();
    let latest = app.latest_snapshot().unwrap();
    assert_eq!(latest.timestamp, 0);
    assert!(latest.is_zero());

    let a = app.counter_id("A").unwrap();
    for _ in 0..4 {
        app.increment(a);
    }

    tokio::time::sleep(Duration::from_millis(300)).await;
    let history = app.history().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].value("A"), 4);
    assert_eq!(history[0].value("B"), 0);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(app.history().unwrap().len(), 1);

    app.increment(a);
    tokio::time::sleep(Duration::from_millis(200)).await;
    let history = app.history().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].value("A"), 5);
    assert!(history[1].timestamp >= history[0].timestamp);
    assert_eq!(app.latest_snapshot().unwrap(), history[1]);

    app.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_disabled_snapshot_task_writes_nothing() {
    let temp_dir = tempdir().unwrap();
    let config = config_in(temp_dir.path());

    let app = App::start(config).await.unwrap();
    let views = app.counter_id("views").unwrap();
    app.increment(views);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(app.history().unwrap().is_empty());

    app.shutdown().await.unwrap();
}
