//! Non-blocking publish/subscribe fan-out of counter updates.
//!
//! # Architecture
//!
//! ```text
//! BroadcastScheduler ──publish(event)──► Broadcaster [Mutex<registry>]
//!                                           ├─ try_send ─► Subscription 1 (bounded queue)
//!                                           ├─ try_send ─► Subscription 2 (bounded queue)
//!                                           └─ try_send ─► Subscription N (bounded queue)
//! ```
//!
//! # Delivery
//!
//! - Per-subscriber FIFO; no ordering across subscribers
//! - When a subscriber's queue is full the event is dropped for that
//!   subscriber only. Every event carries absolute counter values, so a
//!   subscriber that misses one is corrected by the next
//! - Publishing never blocks and never fails

mod broadcaster;
mod event;


pub use broadcaster::*;
pub use event::*;

/// Pending events a subscriber may buffer before new ones are dropped.
pub const DEFAULT_SUBSCRIBER_QUEUE_CAPACITY: usize = 100;
