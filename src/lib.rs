//! # tally
//!
//! Named in-memory counters with periodic durable snapshots and a live,
//! non-blocking fan-out of counter updates.
//!
//! - [`CounterStore`] - lock-free counters, the source of truth for current values
//! - [`SnapshotRepository`] - append-only history of counter values (sled)
//! - [`Broadcaster`] - bounded per-subscriber queues, drop-on-full
//! - [`scheduler`] - periodic tasks that persist and publish changes
//! - [`App`] - wires everything together from a [`TallyConfig`]
//!
//! ```ignore
//! let app = App::start(TallyConfig::new()?.validate()?).await?;
//!
//! let views = app.counter_id("views").unwrap();
//! app.increment(views);
//!
//! let mut sub = app.subscribe();
//! while let Some(Event::CountersUpdated(point)) = sub.recv().await {
//!     println!("{} {:?}", point.ts, point.values);
//! }
//! ```

mod app;
mod broadcast;
mod config;
mod counter;
mod errors;
pub mod scheduler;
mod storage;
pub mod utils;

pub use app::*;
pub use broadcast::*;
pub use config::*;
pub use counter::*;
pub use errors::*;
pub use storage::*;
#[doc(hidden)]
pub use utils::*;


#[cfg(test)]
pub mod test_utils;
