//! Danmaku: fetching time-synced comments for an episode from many providers.
//!
//! This crate fans a single [`DanmakuFetchRequest`] out to every registered
//! provider concurrently and merges their answers into one [`AggregateResult`].
//! A provider that fails, panics or exceeds its timeout only affects its own
//! entry in the aggregate.
//!
//! ## Core Types
//!
//! - [`DanmakuFetchRequest`] - Immutable description of the episode to fetch for
//! - [`DanmakuProvider`] - Trait for provider-specific clients
//! - [`ProviderOutcome`] - Success, failure or timeout of one provider
//! - [`AggregateResult`] - Ordered outcomes of one fetch
//!
//! ## Fetching
//!
//! - [`fetch_all`] - Concurrent fan-out with per-provider timeouts
//! - [`ProviderRegistry`] - Ordered set of providers
//!
//! ## Loading
//!
//! - [`DanmakuLoadingState`] - `Idle` / `Loading` / `Success` / `Failed`
//! - [`DanmakuLoader`] - Serves one request at a time, cancelling superseded fetches
//! - [`DanmakuStatistics`] - Source and danmaku counts for display

pub mod aggregator;
pub mod config;
pub mod error;
pub mod loader;
pub mod message;
pub mod provider;
pub mod registry;
pub mod request;
pub mod state;
pub mod statistics;

#[cfg(test)]
mod test_utils;

pub use aggregator::{AggregateResult, fetch_all};
pub use config::FetchConfig;
pub use error::{AggregationError, DanmakuError, Result, StateError};
pub use loader::DanmakuLoader;
pub use message::{Danmaku, DanmakuLocation, DanmakuMatch, DanmakuMatchInfo, DanmakuMatchMethod};
pub use provider::{DanmakuProvider, ProviderFetchResult, ProviderOutcome};
pub use registry::ProviderRegistry;
pub use request::{DanmakuFetchRequest, EpisodeInfo, SubjectInfo};
pub use state::DanmakuLoadingState;
pub use statistics::DanmakuStatistics;
