//! In-process playback signals for a session without a real player.

use std::sync::Arc;

use async_trait::async_trait;
use playback_stats::{
    Media, MediaFetchSignal, MediaSelector, MediaSourceInfo, MediaSourceInfoResolver,
    PlayerSignal, ResolveError, StatisticsInputs, VideoLoadingState,
};
use tokio::sync::watch;

/// Source ID of media played from a local file.
pub const LOCAL_SOURCE_ID: &str = "local";

/// Playback state driven directly by the caller.
pub struct LocalPlayback {
    media: watch::Sender<Option<Media>>,
    filename: watch::Sender<Option<String>>,
    loading_state: watch::Sender<VideoLoadingState>,
    fetching: watch::Sender<bool>,
}

impl LocalPlayback {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            media: watch::Sender::new(None),
            filename: watch::Sender::new(None),
            loading_state: watch::Sender::new(VideoLoadingState::Initial),
            fetching: watch::Sender::new(false),
        })
    }

    /// Inputs for a statistics collector observing this playback.
    pub fn inputs(self: &Arc<Self>, resolver: Arc<dyn MediaSourceInfoResolver>) -> StatisticsInputs {
        StatisticsInputs {
            media_selector: self.clone(),
            source_info_resolver: resolver,
            player: self.clone(),
            media_fetch: self.clone(),
        }
    }

    pub fn select(&self, media: Option<Media>) {
        self.media.send_replace(media);
    }

    /// Play a local file, selecting it as media.
    pub fn open_file(&self, filename: &str) {
        self.select(Some(Media::new(filename, LOCAL_SOURCE_ID, filename)));
        self.filename.send_replace(Some(filename.to_string()));
        self.loading_state
            .send_replace(VideoLoadingState::Succeed { is_bt: false });
    }

    pub fn set_loading_state(&self, state: VideoLoadingState) {
        self.loading_state.send_replace(state);
    }

    pub fn set_fetching(&self, fetching: bool) {
        self.fetching.send_replace(fetching);
    }
}

impl MediaSelector for LocalPlayback {
    fn selected(&self) -> watch::Receiver<Option<Media>> {
        self.media.subscribe()
    }
}

impl PlayerSignal for LocalPlayback {
    fn filename(&self) -> watch::Receiver<Option<String>> {
        self.filename.subscribe()
    }

    fn loading_state(&self) -> watch::Receiver<VideoLoadingState> {
        self.loading_state.subscribe()
    }
}

impl MediaFetchSignal for LocalPlayback {
    fn is_loading(&self) -> watch::Receiver<bool> {
        self.fetching.subscribe()
    }
}

/// Knows only the local file source.
pub struct LocalSourceResolver;

#[async_trait]
impl MediaSourceInfoResolver for LocalSourceResolver {
    async fn resolve(&self, media_source_id: &str) -> Result<MediaSourceInfo, ResolveError> {
        match media_source_id {
            LOCAL_SOURCE_ID => {
                let mut info = MediaSourceInfo::new("Local file");
                info.description = Some("Played from the local file system".to_string());
                Ok(info)
            }
            other => Err(ResolveError::UnknownSource(other.to_string())),
        }
    }
}
