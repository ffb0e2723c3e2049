use std::sync::Arc;

use tokio::sync::mpsc::error::TryRecvError;

use super::*;
use crate::Broadcaster;
use crate::CounterStore;
use crate::CounterValues;
use crate::Event;

fn setup() -> (Arc<CounterStore>, Broadcaster, BroadcastScheduler) {
    let store = Arc::new(CounterStore::new(["A", "B"]));
    let broadcaster = Broadcaster::new(8);
    let scheduler = BroadcastScheduler::new(store.clone(), broadcaster.clone(), CounterValues::new());
    (store, broadcaster, scheduler)
}

#[tokio::test]
async fn test_unchanged_counters_publish_nothing() {
    let (_store, broadcaster, mut scheduler) = setup();
    let mut sub = broadcaster.subscribe();

    assert_eq!(scheduler.tick(), TickOutcome::Unchanged);
    assert!(matches!(sub.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_change_publishes_one_point_with_absolute_values() {
    let (store, broadcaster, mut scheduler) = setup();
    let mut sub = broadcaster.subscribe();
    let a = store.id("A").unwrap();
    store.increment(a);
    store.increment(a);

    assert_eq!(scheduler.tick(), TickOutcome::Applied);
    assert_eq!(scheduler.tick(), TickOutcome::Unchanged);

    let Some(Event::CountersUpdated(point)) = sub.recv().await else {
        panic!("expected a point");
    };
    assert_eq!(point.value("A"), 2);
    assert_eq!(point.value("B"), 0);
    assert!(point.ts > 0);
    assert!(matches!(sub.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn test_tick_never_stalls_on_full_subscribers() {
    let (store, broadcaster, mut scheduler) = setup();
    let _stalled: Vec<_> = (0..10).map(|_| broadcaster.subscribe()).collect();
    let a = store.id("A").unwrap();

    for _ in 0..50 {
        store.increment(a);
        assert_eq!(scheduler.tick(), TickOutcome::Applied);
    }
    assert_eq!(broadcaster.subscriber_count(), 10);
}
