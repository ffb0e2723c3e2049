use std::path::Path;
use std::time::Duration;

use tally::Event;
use tally::Point;
use tally::Subscription;
use tally::TallyConfig;

pub const RECV_TIMEOUT_IN_MS: u64 = 2_000;

/// Config rooted in `dir` with both schedulers disabled.
pub fn config_in(dir: &Path) -> TallyConfig {
    let mut config = TallyConfig::default();
    config.storage.db_path = dir.join("db").join("tally.db");
    config.storage.backup_dir = dir.join("backups");
    config.log_dir = dir.join("logs");
    config.counters = vec!["A".into(), "B".into(), "views".into()];
    config.validate().expect("valid test config")
}

/// Next point on `sub`, failing the test if none arrives in time.
pub async fn next_point(sub: &mut Subscription) -> Point {
    match tokio::time::timeout(Duration::from_millis(RECV_TIMEOUT_IN_MS), sub.recv()).await {
        Ok(Some(Event::CountersUpdated(point))) => point,
        Ok(None) => panic!("subscription closed unexpectedly"),
        Err(_) => panic!("no point received within {RECV_TIMEOUT_IN_MS}ms"),
    }
}

pub fn backup_artifacts(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return vec![];
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(tally::BACKUP_PREFIX))
        .collect();
    names.sort();
    names
}
