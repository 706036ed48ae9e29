//! Statistics snapshot of the video being played.

use serde::Serialize;

use crate::media::{Media, MediaSourceInfo, VideoLoadingState};

/// Resolution of the selected media's source info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum SourceInfoState {
    /// No media selected
    #[default]
    None,
    /// Lookup in flight
    Pending,
    Resolved(MediaSourceInfo),
    /// Lookup failed; carries the error message
    Failed(String),
}

impl SourceInfoState {
    pub fn info(&self) -> Option<&MediaSourceInfo> {
        match self {
            Self::Resolved(info) => Some(info),
            _ => None,
        }
    }
}

/// What is playing right now, and how far loading got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatisticsSnapshot {
    /// Set as soon as a media is selected
    pub playing_media: Option<Media>,
    /// Source info of [`playing_media`](Self::playing_media)
    pub playing_media_source_info: SourceInfoState,
    /// Filename reported by the player, falling back to the media's original title
    pub playing_filename: Option<String>,
    /// Whether media sources are still being searched
    pub media_source_loading: bool,
    pub video_loading_state: VideoLoadingState,
    pub is_placeholder: bool,
}

impl StatisticsSnapshot {
    /// Value observed before anything has been computed.
    pub const PLACEHOLDER: Self = Self {
        playing_media: None,
        playing_media_source_info: SourceInfoState::None,
        playing_filename: None,
        media_source_loading: false,
        video_loading_state: VideoLoadingState::Initial,
        is_placeholder: true,
    };

    pub fn source_info(&self) -> Option<&MediaSourceInfo> {
        self.playing_media_source_info.info()
    }
}

impl Default for StatisticsSnapshot {
    fn default() -> Self {
        Self::PLACEHOLDER
    }
}

/// Latest value of every input, combined into snapshots.
#[derive(Debug, Clone, Default)]
pub(crate) struct SnapshotFields {
    pub media: Option<Media>,
    pub source_info: SourceInfoState,
    pub filename: Option<String>,
    pub media_source_loading: bool,
    pub video_loading_state: VideoLoadingState,
}

impl SnapshotFields {
    pub fn snapshot(&self) -> StatisticsSnapshot {
        let playing_filename = self.filename.clone().or_else(|| {
            self.media
                .as_ref()
                .map(|m| m.original_title.clone())
                .filter(|title| !title.is_empty())
        });

        StatisticsSnapshot {
            playing_media: self.media.clone(),
            playing_media_source_info: self.source_info.clone(),
            playing_filename,
            media_source_loading: self.media_source_loading,
            video_loading_state: self.video_loading_state.clone(),
            is_placeholder: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder() {
        let placeholder = StatisticsSnapshot::default();
        assert!(placeholder.is_placeholder);
        assert!(placeholder.playing_media.is_none());
        assert!(placeholder.source_info().is_none());
        assert_eq!(placeholder.video_loading_state, VideoLoadingState::Initial);
    }

    #[test]
    fn test_filename_falls_back_to_original_title() {
        let mut fields = SnapshotFields {
            media: Some(Media::new("m1", "mikan", "[SubsPlease] Frieren - 12 (1080p).mkv")),
            ..Default::default()
        };
        assert_eq!(
            fields.snapshot().playing_filename.as_deref(),
            Some("[SubsPlease] Frieren - 12 (1080p).mkv")
        );

        fields.filename = Some("Frieren - 12.mkv".to_string());
        assert_eq!(
            fields.snapshot().playing_filename.as_deref(),
            Some("Frieren - 12.mkv")
        );

        fields.media = None;
        fields.filename = None;
        let snapshot = fields.snapshot();
        assert!(snapshot.playing_filename.is_none());
        assert!(!snapshot.is_placeholder);
    }

    #[test]
    fn test_source_info_state_serialization() {
        let json = serde_json::to_value(SourceInfoState::Failed("timeout".into())).unwrap();
        assert_eq!(json, serde_json::json!({ "state": "failed", "value": "timeout" }));
    }
}
