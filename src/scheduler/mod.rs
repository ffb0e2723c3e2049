//! Periodic background tasks driven by counter changes.
//!
//! Both schedulers poll the [`CounterStore`](crate::CounterStore) on their own
//! interval and act only when at least one counter moved since their previous
//! tick:
//!
//! ```text
//! SnapshotScheduler  ── tick ──► values changed? ──► SnapshotRepository::append
//! BroadcastScheduler ── tick ──► values changed? ──► Broadcaster::publish
//! ```
//!
//! The tasks are owned: [`spawn_periodic`] returns the `JoinHandle` and the
//! loop exits when the shared shutdown signal fires.

mod broadcast_scheduler;
mod change_tracker;
mod snapshot_scheduler;

#[cfg(test)]
mod broadcast_scheduler_test;

use std::time::Duration;

pub use broadcast_scheduler::*;
pub use change_tracker::*;
pub use snapshot_scheduler::*;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::error;
use tracing::info;

/// What a single tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No tracked counter changed; nothing was done
    Unchanged,
    /// The change was written or published
    Applied,
    /// The change was observed but the write failed; logged and not retried
    Failed,
}

/// A unit of periodic work.
pub trait PeriodicTask: Send + 'static {
    /// Name used in logs.
    const NAME: &'static str;

    fn tick(&mut self) -> TickOutcome;

    /// Called once after the shutdown signal, before the task exits.
    fn on_shutdown(&mut self) {}
}

/// Spawns `task` on a fixed `period`. A zero period disables the task and
/// returns `None`.
///
/// The first tick happens one full period after spawning. Each tick and the
/// shutdown hook run on the blocking pool. The loop exits when `shutdown`
/// fires or its sender is dropped.
pub fn spawn_periodic<T: PeriodicTask>(
    mut task: T,
    period: Duration,
    mut shutdown: watch::Receiver<()>,
) -> Option<JoinHandle<()>> {
    if period.is_zero() {
        info!(task = T::NAME, "interval is zero, task disabled");
        return None;
    }

    info!(task = T::NAME, ?period, "periodic task started");

    Some(tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let Some((returned, outcome)) = run_blocking(task, |t| t.tick()).await else {
                        return;
                    };
                    task = returned;
                    if outcome != TickOutcome::Unchanged {
                        debug!(task = T::NAME, ?outcome, "tick");
                    }
                }

                _ = shutdown.changed() => {
                    info!(task = T::NAME, "periodic task shutting down");
                    break;
                }
            }
        }

        if run_blocking(task, |t| t.on_shutdown()).await.is_some() {
            info!(task = T::NAME, "periodic task stopped");
        }
    }))
}

/// Runs `f` on the blocking pool so storage I/O never occupies a runtime
/// worker. `None` if `f` panicked; the task is gone in that case.
async fn run_blocking<T, R, F>(
    mut task: T,
    f: F,
) -> Option<(T, R)>
where
    T: PeriodicTask,
    R: Send + 'static,
    F: FnOnce(&mut T) -> R + Send + 'static,
{
    match tokio::task::spawn_blocking(move || {
        let result = f(&mut task);
        (task, result)
    })
    .await
    {
        Ok(done) => Some(done),
        Err(e) => {
            error!(task = T::NAME, ?e, "periodic task panicked, stopped");
            None
        }
    }
}
