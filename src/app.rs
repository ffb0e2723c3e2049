//! Application facade wiring the counter store, snapshot storage, the
//! broadcaster and the two periodic schedulers.
//!
//! ```text
//!            increment/load                      subscribe/unsubscribe
//! caller ───────────────► CounterStore      caller ─────────────► Broadcaster
//!                            │    │                                   ▲
//!            SnapshotScheduler    BroadcastScheduler ──── publish ─────┘
//!                    │
//!                    ▼
//!          SnapshotRepository ── backup_into (startup)
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;

use crate::scheduler::spawn_periodic;
use crate::scheduler::BroadcastScheduler;
use crate::scheduler::SnapshotScheduler;
use crate::Broadcaster;
use crate::CounterId;
use crate::CounterStore;
use crate::CounterValues;
use crate::Error;
use crate::Result;
use crate::SledSnapshotRepository;
use crate::Snapshot;
use crate::SnapshotRepository;
use crate::Subscription;
use crate::SubscriptionId;
use crate::SystemError;
use crate::TallyConfig;

/// A running counter service.
///
/// Background tasks are owned: they stop on [`App::shutdown`], or when the
/// `App` is dropped.
pub struct App<R: SnapshotRepository = SledSnapshotRepository> {
    config: TallyConfig,
    store: Arc<CounterStore>,
    repository: Arc<R>,
    broadcaster: Broadcaster,

    shutdown_tx: watch::Sender<()>,
    handles: Vec<JoinHandle<()>>,
}

impl<R: SnapshotRepository> Debug for App<R> {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("App")
            .field("store", &self.store)
            .field("broadcaster", &self.broadcaster)
            .field("tasks", &self.handles.len())
            .finish()
    }
}

impl App<SledSnapshotRepository> {
    /// Opens the snapshot database named in `config` and starts the service.
    ///
    /// Failing to open the database is fatal.
    pub async fn start(config: TallyConfig) -> Result<Self> {
        let repository = SledSnapshotRepository::open(&config.storage.db_path, &config.counters)
            .map_err(|e| Error::fatal("open snapshot repository", e))?;

        Self::start_with_repository(config, Arc::new(repository)).await
    }
}

impl<R: SnapshotRepository> App<R> {
    /// Starts the service on an already opened repository:
    /// - seeds the counters from the latest snapshot
    /// - backs the database up unless there is nothing to back up
    /// - spawns the enabled schedulers
    pub async fn start_with_repository(
        config: TallyConfig,
        repository: Arc<R>,
    ) -> Result<Self> {
        let store = Arc::new(CounterStore::new(config.counters.iter().cloned()));

        let latest = repository
            .load_latest()
            .map_err(|e| Error::fatal("load latest snapshot", e))?;
        store.seed(&latest.values);
        info!(timestamp = latest.timestamp, values = ?store.values(), "counters restored");

        if store.is_idle() {
            debug!("no counter activity recorded yet, backup skipped");
        } else {
            let backup_repository = repository.clone();
            let backup_dir = config.storage.backup_dir.clone();
            match tokio::task::spawn_blocking(move || backup_repository.backup_into(&backup_dir)).await {
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    error!(?e, dir = %config.storage.backup_dir.display(), "backup failed, continuing")
                }
                Err(e) => error!(?e, "backup task failed, continuing"),
            }
        }

        let broadcaster = Broadcaster::new(config.broadcast.subscriber_queue_capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(());

        let mut handles = Vec::new();
        handles.extend(spawn_periodic(
            SnapshotScheduler::new(store.clone(), repository.clone(), &latest),
            config.scheduler.snapshot_interval(),
            shutdown_rx.clone(),
        ));
        handles.extend(spawn_periodic(
            BroadcastScheduler::new(store.clone(), broadcaster.clone(), store.values()),
            config.scheduler.broadcast_interval(),
            shutdown_rx,
        ));

        info!(counters = ?config.counters, tasks = handles.len(), "tally started");

        Ok(Self {
            config,
            store,
            repository,
            broadcaster,
            shutdown_tx,
            handles,
        })
    }

    pub fn config(&self) -> &TallyConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<CounterStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn counter_id(
        &self,
        name: &str,
    ) -> Option<CounterId> {
        self.store.id(name)
    }

    /// Adds one and returns the new value.
    pub fn increment(
        &self,
        id: CounterId,
    ) -> u64 {
        self.store.increment(id)
    }

    pub fn load(
        &self,
        id: CounterId,
    ) -> u64 {
        self.store.load(id)
    }

    pub fn values(&self) -> CounterValues {
        self.store.values()
    }

    pub fn subscribe(&self) -> Subscription {
        self.broadcaster.subscribe()
    }

    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        self.broadcaster.unsubscribe(id)
    }

    pub fn latest_snapshot(&self) -> Result<Snapshot> {
        self.repository.load_latest()
    }

    /// Every persisted snapshot, oldest first.
    pub fn history(&self) -> Result<Vec<Snapshot>> {
        self.repository.history()
    }

    pub fn history_since(
        &self,
        since: u64,
    ) -> Result<Vec<Snapshot>> {
        self.repository.history_since(since)
    }

    /// Stops the schedulers, waits for them to finish their final tick and
    /// flushes the repository.
    ///
    /// Every task is joined and the flush runs even if a task failed; the
    /// first error is returned.
    pub async fn shutdown(mut self) -> Result<()> {
        info!("tally shutting down");

        let handles = std::mem::take(&mut self.handles);
        let mut first_error: Option<Error> = None;

        if !handles.is_empty() {
            if let Err(e) = self.shutdown_tx.send(()) {
                error!("Failed to send shutdown signal: {}", e);
                first_error = Some(SystemError::SignalSendFailed(e.to_string()).into());
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(?e, "background task failed");
                first_error.get_or_insert(e.into());
            }
        }

        let repository = self.repository.clone();
        let flushed = match tokio::task::spawn_blocking(move || repository.flush()).await {
            Ok(result) => result,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = flushed {
            error!(?e, "flush on shutdown failed");
            first_error.get_or_insert(e);
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!("tally stopped");
                Ok(())
            }
        }
    }
}
