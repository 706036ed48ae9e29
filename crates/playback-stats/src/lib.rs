//! Playback statistics: what is playing and how far loading got.
//!
//! [`VideoStatisticsCollector`] observes the selected media, the player and the
//! media-source search, resolves the selected media's source info, and shares
//! the combined [`StatisticsSnapshot`] with every subscriber.
//!
//! - A new selection cancels the previous source-info lookup; a superseded
//!   lookup never reaches a snapshot.
//! - Each input updates its own field as soon as it changes.
//! - Subscribers attaching late get the latest snapshot first.
//! - Nothing runs without subscribers. After the last one detaches the
//!   computation stops once the grace period elapses, and the next subscriber
//!   starts over from [`StatisticsSnapshot::PLACEHOLDER`].

pub mod collector;
pub mod config;
pub mod error;
pub mod media;
pub mod shared;
pub mod snapshot;
pub mod source;

pub use collector::VideoStatisticsCollector;
pub use config::StatisticsConfig;
pub use error::{ResolveError, StatisticsError};
pub use media::{Media, MediaSourceInfo, VideoLoadFailure, VideoLoadingState};
pub use shared::{SharedState, Subscription};
pub use snapshot::{SourceInfoState, StatisticsSnapshot};
pub use source::{
    MediaFetchSignal, MediaSelector, MediaSourceInfoResolver, PlayerSignal, StatisticsInputs,
};
