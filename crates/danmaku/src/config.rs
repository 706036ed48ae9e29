//! Aggregation configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default per-provider timeout in milliseconds.
const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;

/// Configuration for a fetch across all providers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Budget for each provider call, in milliseconds
    pub provider_timeout_ms: u64,
}

impl FetchConfig {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            provider_timeout_ms: timeout.as_millis() as u64,
        }
    }

    /// Budget for each provider call.
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeout() {
        assert_eq!(
            FetchConfig::default().provider_timeout(),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: FetchConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, FetchConfig::default());

        let config: FetchConfig = serde_json::from_str(r#"{"provider_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.provider_timeout(), Duration::from_millis(250));
    }
}
