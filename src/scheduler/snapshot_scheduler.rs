use std::sync::Arc;

use tracing::error;
use tracing::info;

use super::ChangeTracker;
use super::PeriodicTask;
use super::TickOutcome;
use crate::time::get_now_as_u64;
use crate::CounterStore;
use crate::Snapshot;
use crate::SnapshotRepository;

/// Appends a [`Snapshot`] whenever counters changed since the previous tick.
pub struct SnapshotScheduler<R: SnapshotRepository> {
    store: Arc<CounterStore>,
    repository: Arc<R>,
    tracker: ChangeTracker,
    last_timestamp: u64,
}

impl<R: SnapshotRepository> SnapshotScheduler<R> {
    /// `baseline` is the latest persisted snapshot, so a restart with
    /// unchanged counters does not write a duplicate row.
    pub fn new(
        store: Arc<CounterStore>,
        repository: Arc<R>,
        baseline: &Snapshot,
    ) -> Self {
        Self {
            store,
            repository,
            tracker: ChangeTracker::new(baseline.values.clone()),
            last_timestamp: baseline.timestamp,
        }
    }

    /// Row timestamps never go backwards, even if the wall clock does.
    fn next_timestamp(&mut self) -> u64 {
        self.last_timestamp = self.last_timestamp.max(get_now_as_u64());
        self.last_timestamp
    }
}

impl<R: SnapshotRepository> PeriodicTask for SnapshotScheduler<R> {
    const NAME: &'static str = "snapshot";

    fn tick(&mut self) -> TickOutcome {
        let Some(values) = self.tracker.observe(self.store.values()) else {
            return TickOutcome::Unchanged;
        };

        let snapshot = Snapshot::new(self.next_timestamp(), values);
        match self.repository.append(&snapshot) {
            Ok(()) => {
                info!(timestamp = snapshot.timestamp, values = ?snapshot.values, "snapshot taken");
                TickOutcome::Applied
            }
            Err(e) => {
                error!(?e, values = ?snapshot.values, "Error taking snapshot");
                TickOutcome::Failed
            }
        }
    }

    /// Persists whatever changed since the last tick so a clean shutdown
    /// loses nothing.
    fn on_shutdown(&mut self) {
        self.tick();
        if let Err(e) = self.repository.flush() {
            error!(?e, "flush on shutdown failed");
        }
    }
}
