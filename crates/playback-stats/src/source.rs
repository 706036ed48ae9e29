//! Collaborators the statistics collector observes.
//!
//! Observable values are exposed as `tokio::sync::watch` receivers. The
//! collector asks for fresh receivers every time it is activated, so an
//! implementation may start its own upstream work lazily.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::ResolveError;
use crate::media::{Media, MediaSourceInfo, VideoLoadingState};

/// Exposes the media currently selected for playback.
pub trait MediaSelector: Send + Sync {
    fn selected(&self) -> watch::Receiver<Option<Media>>;
}

/// Exposes what the player knows about the video it is playing.
pub trait PlayerSignal: Send + Sync {
    /// Filename of the video once the player has opened it.
    fn filename(&self) -> watch::Receiver<Option<String>>;

    fn loading_state(&self) -> watch::Receiver<VideoLoadingState>;
}

/// Exposes whether media sources are still being searched.
pub trait MediaFetchSignal: Send + Sync {
    fn is_loading(&self) -> watch::Receiver<bool>;
}

/// Resolves the display info of a media source.
///
/// The collector drops the returned future when the selection changes, so
/// implementations must release their I/O on drop.
#[async_trait]
pub trait MediaSourceInfoResolver: Send + Sync {
    async fn resolve(&self, media_source_id: &str) -> Result<MediaSourceInfo, ResolveError>;
}

impl MediaSelector for watch::Sender<Option<Media>> {
    fn selected(&self) -> watch::Receiver<Option<Media>> {
        self.subscribe()
    }
}

impl MediaFetchSignal for watch::Sender<bool> {
    fn is_loading(&self) -> watch::Receiver<bool> {
        self.subscribe()
    }
}

/// Every input the collector combines.
#[derive(Clone)]
pub struct StatisticsInputs {
    pub media_selector: Arc<dyn MediaSelector>,
    pub source_info_resolver: Arc<dyn MediaSourceInfoResolver>,
    pub player: Arc<dyn PlayerSignal>,
    pub media_fetch: Arc<dyn MediaFetchSignal>,
}
