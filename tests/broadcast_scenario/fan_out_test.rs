use std::time::Duration;

use tally::App;
use tempfile::tempdir;
use tokio_stream::StreamExt;

use crate::common::config_in;
use crate::common::next_point;

/// # Case 1: two subscribers, one unsubscribes
///
/// ## Criterias:
/// 1. both receive the first point with the absolute counter values
/// 2. after S2 unsubscribes, only S1 receives the next point
/// 3. S2's stream ends
#[tokio::test]
async fn test_two_subscribers_then_one_leaves() {
    crate::enable_logger();
    let temp_dir = tempdir().unwrap();
    let mut config = config_in(temp_dir.path());
    config.scheduler.broadcast_interval_in_ms = 20;

    let app = App::start(config).await.unwrap();
    let mut s1 = app.subscribe();
    let mut s2 = app.subscribe();
    let a = app.counter_id("A").unwrap();

    app.increment(a);
    let p1 = next_point(&mut s1).await;
    let p2 = next_point(&mut s2).await;
    assert_eq!(p1.value("A"), 1);
    assert_eq!(p1, p2);

    assert!(app.unsubscribe(s2.id()));
    app.increment(a);

    let p1 = next_point(&mut s1).await;
    assert_eq!(p1.value("A"), 2);
    let tail: Vec<_> = s2.collect().await;
    assert!(tail.is_empty());

    app.shutdown().await.unwrap();
}

/// # Case 2: a subscriber that never reads
///
/// ## Criterias:
/// 1. it does not slow the healthy subscriber down
/// 2. its queue never holds more than the configured capacity
#[tokio::test]
async fn test_stalled_subscriber_does_not_block_others() {
    let temp_dir = tempdir().unwrap();
    let mut config = config_in(temp_dir.path());
    config.scheduler.broadcast_interval_in_ms = 5;
    config.broadcast.subscriber_queue_capacity = 2;

    let app = App::start(config).await.unwrap();
    let stalled = app.subscribe();
    let mut healthy = app.subscribe();
    let views = app.counter_id("views").unwrap();

    for expected in 1..=10 {
        app.increment(views);
        let mut point = next_point(&mut healthy).await;
        while point.value("views") < expected {
            point = next_point(&mut healthy).await;
        }
        assert_eq!(point.value("views"), expected);
    }

    assert!(stalled.pending() <= 2);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(app.broadcaster().subscriber_count(), 2);

    app.shutdown().await.unwrap();
}
