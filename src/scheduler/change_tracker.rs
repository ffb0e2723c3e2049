use crate::CounterValues;

/// Remembers the values seen at the previous tick.
///
/// The baseline moves on every observed change, including changes whose
/// write later fails: a failed write is not retried with the same delta.
#[derive(Debug, Clone, Default)]
pub struct ChangeTracker {
    previous: CounterValues,
}

impl ChangeTracker {
    pub fn new(baseline: CounterValues) -> Self {
        Self { previous: baseline }
    }

    /// Returns `current` if any counter differs from the baseline and makes
    /// it the new baseline; `None` when every counter is unchanged.
    pub fn observe(
        &mut self,
        current: CounterValues,
    ) -> Option<CounterValues> {
        let changed = current.iter().any(|(name, value)| self.baseline_of(name) != *value);
        if !changed {
            return None;
        }
        self.previous = current.clone();
        Some(current)
    }

    pub fn baseline(&self) -> &CounterValues {
        &self.previous
    }

    fn baseline_of(
        &self,
        name: &str,
    ) -> u64 {
        self.previous.get(name).copied().unwrap_or(0)
    }
}
