use serde::Deserialize;
use serde::Serialize;

use crate::CounterValues;
use crate::Snapshot;

/// Counter values observed at one instant, as pushed to live subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    /// Seconds since the unix epoch (UTC)
    pub ts: u64,
    pub values: CounterValues,
}

impl Point {
    pub fn new(
        ts: u64,
        values: CounterValues,
    ) -> Self {
        Self { ts, values }
    }

    pub fn value(
        &self,
        name: &str,
    ) -> u64 {
        self.values.get(name).copied().unwrap_or(0)
    }
}

impl From<Snapshot> for Point {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            ts: snapshot.timestamp,
            values: snapshot.values,
        }
    }
}

/// Everything the broadcaster can deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// At least one tracked counter changed since the previous broadcast
    CountersUpdated(Point),
}

impl Event {
    /// Event name for stream framing.
    pub fn name(&self) -> &'static str {
        match self {
            Event::CountersUpdated(_) => "point",
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Event::CountersUpdated(point) => point.ts,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Renders the event as one server-sent-events frame:
    /// `id:<ts>\nevent:<name>\ndata:<json>\n\n`.
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        Ok(format!(
            "id:{}\nevent:{}\ndata:{}\n\n",
            self.timestamp(),
            self.name(),
            self.to_json()?
        ))
    }
}

impl From<Point> for Event {
    fn from(point: Point) -> Self {
        Event::CountersUpdated(point)
    }
}
