use std::sync::Arc;

use tracing::trace;

use super::ChangeTracker;
use super::PeriodicTask;
use super::TickOutcome;
use crate::time::get_now_as_u64;
use crate::Broadcaster;
use crate::CounterStore;
use crate::CounterValues;
use crate::Event;
use crate::Point;

/// Publishes a [`Point`] whenever counters changed since the previous tick.
///
/// Publishing is non-blocking, so a tick costs the same no matter how many
/// subscribers exist or how slow they are.
pub struct BroadcastScheduler {
    store: Arc<CounterStore>,
    broadcaster: Broadcaster,
    tracker: ChangeTracker,
}

impl BroadcastScheduler {
    pub fn new(
        store: Arc<CounterStore>,
        broadcaster: Broadcaster,
        baseline: CounterValues,
    ) -> Self {
        Self {
            store,
            broadcaster,
            tracker: ChangeTracker::new(baseline),
        }
    }
}

impl PeriodicTask for BroadcastScheduler {
    const NAME: &'static str = "broadcast";

    fn tick(&mut self) -> TickOutcome {
        let Some(values) = self.tracker.observe(self.store.values()) else {
            return TickOutcome::Unchanged;
        };

        let stats = self.broadcaster.publish(Event::CountersUpdated(Point::new(get_now_as_u64(), values)));
        trace!(?stats, "point broadcast");

        TickOutcome::Applied
    }
}
