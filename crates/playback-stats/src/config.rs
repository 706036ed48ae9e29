//! Statistics stream configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the statistics stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsConfig {
    /// How long to keep computing after the last subscriber detaches, in milliseconds
    pub grace_period_ms: u64,
    /// Buffered snapshots per subscriber before it is resynchronised to the latest
    pub channel_capacity: usize,
}

impl StatisticsConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }
}

impl Default for StatisticsConfig {
    fn default() -> Self {
        Self {
            grace_period_ms: 5_000,
            channel_capacity: 64,
        }
    }
}
