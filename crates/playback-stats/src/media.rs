//! Media and player types consumed by the statistics collector.

use serde::{Deserialize, Serialize};

/// A playable media entry chosen from a media source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Media {
    /// Unique ID of this media within its source
    pub media_id: String,
    /// ID of the source the media was found on
    pub media_source_id: String,
    /// Title as published by the source, usually the release name
    pub original_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_url: Option<String>,
}

impl Media {
    pub fn new(
        media_id: impl Into<String>,
        media_source_id: impl Into<String>,
        original_title: impl Into<String>,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            media_source_id: media_source_id.into(),
            original_title: original_title.into(),
            original_url: None,
        }
    }
}

/// Display information for a media source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSourceInfo {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl MediaSourceInfo {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            description: None,
            website_url: None,
            icon_url: None,
        }
    }
}

/// Why the player could not load the video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "message", rename_all = "snake_case")]
pub enum VideoLoadFailure {
    NoMatchingFile,
    UnsupportedMedia,
    ResolutionTimedOut,
    Unknown(String),
}

/// Loading state reported by the player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VideoLoadingState {
    /// Nothing requested yet
    #[default]
    Initial,
    /// Resolving the media into a playable source
    ResolvingSource,
    /// Source found, waiting for the first frames
    DecodingData,
    Succeed { is_bt: bool },
    Failed { failure: VideoLoadFailure },
}

impl VideoLoadingState {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}
