use std::collections::HashMap;
use std::fmt::Debug;
use std::pin::Pin;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Weak;
use std::task::Context;
use std::task::Poll;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::Stream;
use tracing::debug;
use tracing::trace;

use super::Event;

/// Identifier of a live subscription, unique for the broadcaster's lifetime.
pub type SubscriptionId = u64;

/// Outcome of one [`Broadcaster::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishStats {
    /// Subscribers that had room for the event
    pub delivered: usize,
    /// Subscribers whose queue was full
    pub dropped: usize,
    /// Subscribers found closed and removed from the registry
    pub pruned: usize,
}

struct BroadcasterInner {
    /// One lock guards both registry mutation and fan-out iteration
    subscribers: Mutex<HashMap<SubscriptionId, mpsc::Sender<Event>>>,

    next_id: AtomicU64,

    capacity: usize,
}

impl BroadcasterInner {
    fn remove(
        &self,
        id: SubscriptionId,
    ) -> bool {
        let removed = self.subscribers.lock().remove(&id).is_some();
        if removed {
            debug!(subscription_id = id, "subscriber removed");
        }
        removed
    }
}

/// Fans out [`Event`]s to every live [`Subscription`] without blocking.
///
/// Cloning is cheap and every clone shares the same registry.
///
/// # Example
///
/// ```ignore
/// let broadcaster = Broadcaster::new(100);
/// let mut sub = broadcaster.subscribe();
///
/// broadcaster.publish(Event::CountersUpdated(point));
/// let event = sub.recv().await;
///
/// broadcaster.unsubscribe(sub.id());
/// assert!(sub.recv().await.is_none());
/// ```
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<BroadcasterInner>,
}

impl Debug for Broadcaster {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("subscribers", &self.subscriber_count())
            .field("capacity", &self.inner.capacity)
            .finish()
    }
}

impl Broadcaster {
    /// Creates a broadcaster whose subscribers each buffer up to `capacity`
    /// events (at least one).
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BroadcasterInner {
                subscribers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }

    /// Registers a new subscriber and returns its handle immediately.
    pub fn subscribe(&self) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.inner.capacity);

        let count = {
            let mut subscribers = self.inner.subscribers.lock();
            subscribers.insert(id, sender);
            subscribers.len()
        };

        debug!(subscription_id = id, subscribers = count, "subscriber registered");

        Subscription {
            id,
            receiver,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Removes a subscriber. Its queue is closed: nothing more is sent and a
    /// reader observes end-of-stream once buffered events are drained.
    ///
    /// Returns `false` if the subscriber was already gone.
    pub fn unsubscribe(
        &self,
        id: SubscriptionId,
    ) -> bool {
        self.inner.remove(id)
    }

    /// Offers `event` to every registered subscriber.
    ///
    /// Each enqueue is a `try_send`: a full queue drops the event for that
    /// subscriber only. The registry lock is held for the whole fan-out and no
    /// I/O happens under it.
    pub fn publish(
        &self,
        event: Event,
    ) -> PublishStats {
        let mut stats = PublishStats::default();

        let mut subscribers = self.inner.subscribers.lock();
        subscribers.retain(|id, sender| match sender.try_send(event.clone()) {
            Ok(()) => {
                stats.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                trace!(subscription_id = *id, "subscriber queue full, event dropped");
                stats.dropped += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                stats.pruned += 1;
                false
            }
        });
        drop(subscribers);

        trace!(
            event = event.name(),
            ts = event.timestamp(),
            delivered = stats.delivered,
            dropped = stats.dropped,
            pruned = stats.pruned,
            "event published"
        );

        stats
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().len()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(super::DEFAULT_SUBSCRIBER_QUEUE_CAPACITY)
    }
}

/// Receiving end of one subscriber's bounded queue.
///
/// Dropping the handle unsubscribes it, so a streaming task that is
/// cancelled without calling [`Broadcaster::unsubscribe`] does not leak its
/// queue. Also usable as a [`Stream`] of events.
pub struct Subscription {
    id: SubscriptionId,

    receiver: mpsc::Receiver<Event>,

    registry: Weak<BroadcasterInner>,
}

impl Debug for Subscription {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish_non_exhaustive()
    }
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. `None` once unsubscribed and drained, or
    /// once the broadcaster itself is gone.
    pub async fn recv(&mut self) -> Option<Event> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Result<Event, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Events currently buffered and not yet received.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }
}

impl Stream for Subscription {
    type Item = Event;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
    }
}
