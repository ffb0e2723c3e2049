//! In-memory counter store.
//!
//! The store is the single source of truth for current counter values. The
//! set of counters is fixed when the store is built; names are resolved to a
//! [`CounterId`] once at the boundary so the hot path never touches strings.
//!
//! ```text
//! request handler ──increment(id)──► [AtomicU64; N] ◄──values()── schedulers
//! ```
//!
//! Increments and loads are single atomic instructions. Persistence and
//! broadcast are driven by the schedulers polling [`CounterStore::values`],
//! which keeps write-path latency independent of both.

#[cfg(test)]
mod counter_test;

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use tracing::debug;

/// Counter name → value, ordered by name.
pub type CounterValues = BTreeMap<String, u64>;

/// Index of a counter inside the [`CounterStore`] that issued it.
///
/// An id is only meaningful for that store; [`CounterStore::increment`] and
/// [`CounterStore::load`] panic on an id out of its range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CounterId(usize);

pub struct CounterStore {
    names: Vec<String>,
    values: Vec<AtomicU64>,
}

impl CounterStore {
    /// Creates one zeroed counter per name. Duplicate names share a counter.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for name in names {
            let name = name.into();
            if !unique.contains(&name) {
                unique.push(name);
            }
        }
        let values = unique.iter().map(|_| AtomicU64::new(0)).collect();

        Self {
            names: unique,
            values,
        }
    }

    /// Resolves a counter name.
    pub fn id(
        &self,
        name: &str,
    ) -> Option<CounterId> {
        self.names.iter().position(|n| n == name).map(CounterId)
    }

    /// `None` when `id` came from another store.
    pub fn name(
        &self,
        id: CounterId,
    ) -> Option<&str> {
        self.names.get(id.0).map(String::as_str)
    }

    /// Names in registration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Atomically adds one and returns the post-increment value.
    ///
    /// # Panics
    /// If `id` was issued by a store with more counters.
    #[inline]
    pub fn increment(
        &self,
        id: CounterId,
    ) -> u64 {
        self.values[id.0].fetch_add(1, Ordering::Relaxed) + 1
    }

    #[inline]
    pub fn load(
        &self,
        id: CounterId,
    ) -> u64 {
        self.values[id.0].load(Ordering::Relaxed)
    }

    /// Current value of every counter. Each read is atomic; the set as a
    /// whole is not a consistent cut, which is fine for monotone counters.
    pub fn values(&self) -> CounterValues {
        self.names
            .iter()
            .zip(self.values.iter())
            .map(|(name, value)| (name.clone(), value.load(Ordering::Relaxed)))
            .collect()
    }

    /// Raises counters to at least the given values. Unknown names are ignored
    /// and a counter is never lowered.
    pub fn seed(
        &self,
        values: &CounterValues,
    ) {
        for (name, value) in values {
            if let Some(id) = self.id(name) {
                let previous = self.values[id.0].fetch_max(*value, Ordering::Relaxed);
                debug!(counter = %name, previous, seeded = *value, "counter seeded");
            }
        }
    }

    /// True when no counter has ever moved off zero.
    pub fn is_idle(&self) -> bool {
        self.values.iter().all(|v| v.load(Ordering::Relaxed) == 0)
    }
}

impl Debug for CounterStore {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_map().entries(self.values()).finish()
    }
}
