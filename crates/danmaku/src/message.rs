//! Danmaku content types.
//!
//! Defines the time-synced comments a provider returns and how the provider
//! matched them to the requested episode.

use serde::{Deserialize, Serialize};

/// Where a danmaku is drawn on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DanmakuLocation {
    /// Pinned to the top
    Top,
    /// Pinned to the bottom
    Bottom,
    /// Scrolling
    #[default]
    Normal,
}

/// A single time-synced comment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Danmaku {
    /// Unique ID (provider-specific)
    pub id: String,
    /// Provider that returned this danmaku
    pub provider_id: String,
    /// Offset from the start of the video in milliseconds
    pub play_time_ms: u64,
    pub location: DanmakuLocation,
    pub text: String,
    /// RGB colour, e.g. `0xFFFFFF`
    pub color: u32,
    pub sender_id: String,
}

impl Danmaku {
    /// Create a white scrolling danmaku.
    pub fn new(
        id: impl Into<String>,
        provider_id: impl Into<String>,
        play_time_ms: u64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            provider_id: provider_id.into(),
            play_time_ms,
            location: DanmakuLocation::Normal,
            text: text.into(),
            color: 0xFFFFFF,
            sender_id: String::new(),
        }
    }

    pub fn with_location(mut self, location: DanmakuLocation) -> Self {
        self.location = location;
        self
    }

    pub fn with_color(mut self, color: u32) -> Self {
        self.color = color;
        self
    }

    pub fn with_sender(mut self, sender_id: impl Into<String>) -> Self {
        self.sender_id = sender_id.into();
        self
    }
}

/// How a provider matched the request to its own catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DanmakuMatchMethod {
    /// Subject and episode both matched exactly
    Exact,
    /// Subject matched exactly, episode by a fuzzy title search
    ExactSubjectFuzzyEpisode,
    /// Both matched by fuzzy search
    Fuzzy,
    /// Matched by the local file hash
    FileHash,
    /// Nothing matched; the provider returned no danmaku
    NoMatch,
}

/// Match summary reported by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanmakuMatchInfo {
    pub provider_id: String,
    /// Number of danmaku the provider matched
    pub count: u64,
    pub method: DanmakuMatchMethod,
}

/// A provider's successful response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanmakuMatch {
    pub match_info: DanmakuMatchInfo,
    pub danmaku: Vec<Danmaku>,
}

impl DanmakuMatch {
    /// Build a match whose count is the number of returned danmaku.
    pub fn new(
        provider_id: impl Into<String>,
        method: DanmakuMatchMethod,
        danmaku: Vec<Danmaku>,
    ) -> Self {
        Self {
            match_info: DanmakuMatchInfo {
                provider_id: provider_id.into(),
                count: danmaku.len() as u64,
                method,
            },
            danmaku,
        }
    }

    /// A response for a provider that found nothing.
    pub fn no_match(provider_id: impl Into<String>) -> Self {
        Self::new(provider_id, DanmakuMatchMethod::NoMatch, Vec::new())
    }

    pub fn count(&self) -> u64 {
        self.match_info.count
    }
}
