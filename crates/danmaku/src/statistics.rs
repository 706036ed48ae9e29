//! Danmaku statistics for the current episode.
//!
//! Summarises the loading state the way a player's statistics panel shows it:
//! how many providers matched and how many danmaku they matched in total.

use crate::aggregator::AggregateResult;
use crate::provider::ProviderFetchResult;
use crate::state::DanmakuLoadingState;

/// Statistics for the danmaku of the current episode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DanmakuStatistics {
    /// Whether danmaku display is enabled in the player
    pub enabled: bool,
    pub loading_state: DanmakuLoadingState,
}

impl DanmakuStatistics {
    pub fn new(enabled: bool, loading_state: DanmakuLoadingState) -> Self {
        Self {
            enabled,
            loading_state,
        }
    }

    /// The loaded result, if danmaku is enabled and loading succeeded.
    fn loaded(&self) -> Option<&AggregateResult> {
        self.loading_state.result().filter(|_| self.enabled)
    }

    /// Per-provider outcomes, empty unless enabled and loading succeeded.
    pub fn fetch_results(&self) -> &[ProviderFetchResult] {
        self.loaded()
            .map(|r| r.results())
            .unwrap_or_default()
    }

    /// Number of providers that returned a match.
    pub fn source_count(&self) -> usize {
        self.loaded()
            .map(|r| r.success_count())
            .unwrap_or(0)
    }

    /// Total matched danmaku across providers.
    pub fn total_count(&self) -> u64 {
        self.loaded()
            .map(|r| r.total_count())
            .unwrap_or(0)
    }

    /// One-line summary for display.
    pub fn summary(&self) -> String {
        if !self.enabled {
            return "Danmaku disabled".to_string();
        }
        match &self.loading_state {
            DanmakuLoadingState::Idle => "Danmaku not loaded".to_string(),
            DanmakuLoadingState::Loading => "Loading danmaku".to_string(),
            DanmakuLoadingState::Success(_) => format!(
                "{} sources, {} danmaku in total",
                self.source_count(),
                self.total_count()
            ),
            DanmakuLoadingState::Failed(cause) => format!("Failed to load danmaku: {}", cause),
        }
    }
}
