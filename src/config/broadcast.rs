use config::ConfigError;
use serde::Deserialize;
use serde::Serialize;

use crate::broadcast::DEFAULT_SUBSCRIBER_QUEUE_CAPACITY;
use crate::Error;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BroadcastConfig {
    /// Events buffered per subscriber before new ones are dropped for it
    ///
    /// Default: 100
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
        }
    }
}

impl BroadcastConfig {
    pub fn validate(&self) -> Result<()> {
        if self.subscriber_queue_capacity == 0 {
            return Err(Error::Config(ConfigError::Message(
                "broadcast.subscriber_queue_capacity must be > 0".into(),
            )));
        }
        Ok(())
    }
}

fn default_subscriber_queue_capacity() -> usize {
    DEFAULT_SUBSCRIBER_QUEUE_CAPACITY
}
