//! Fetch request types.
//!
//! A [`DanmakuFetchRequest`] describes one episode (and optionally the local
//! file being played) in enough detail for any provider to look up matching
//! danmaku. Requests compare structurally so that callers can use them as
//! de-duplication keys.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Hash sent when the caller does not know the file hash.
const PLACEHOLDER_FILE_HASH: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Subject (series) metadata used to build a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubjectInfo {
    pub subject_id: u64,
    /// Preferred display name
    pub display_name: String,
    /// Every known name, including translations and aliases
    #[serde(default)]
    pub all_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub air_date: Option<NaiveDate>,
}

impl SubjectInfo {
    pub fn new(subject_id: u64, display_name: impl Into<String>) -> Self {
        let display_name = display_name.into();
        Self {
            subject_id,
            all_names: vec![display_name.clone()],
            display_name,
            air_date: None,
        }
    }

    /// Add an alternate name.
    pub fn with_alias(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.all_names.contains(&name) {
            self.all_names.push(name);
        }
        self
    }

    pub fn with_air_date(mut self, date: NaiveDate) -> Self {
        self.air_date = Some(date);
        self
    }
}

/// Episode metadata used to build a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EpisodeInfo {
    pub episode_id: u64,
    /// Sort key within the subject, e.g. `"12"` or `"SP1"`
    pub sort: String,
    /// Episode number within the current season, if different from `sort`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ep: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl EpisodeInfo {
    pub fn new(episode_id: u64, sort: impl Into<String>) -> Self {
        Self {
            episode_id,
            sort: sort.into(),
            ep: None,
            name: String::new(),
        }
    }

    pub fn with_ep(mut self, ep: impl Into<String>) -> Self {
        self.ep = Some(ep.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Name shown to the user, falling back to the sort key.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("Episode {}", self.sort)
        } else {
            self.name.clone()
        }
    }
}

/// Immutable description of the episode to fetch danmaku for.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DanmakuFetchRequest {
    pub subject_id: u64,
    pub subject_primary_name: String,
    pub subject_names: Vec<String>,
    pub subject_publish_date: Option<NaiveDate>,
    pub episode_id: u64,
    pub episode_sort: String,
    pub episode_ep: Option<String>,
    pub episode_name: String,
    pub filename: Option<String>,
    pub file_hash: Option<String>,
    pub file_size: Option<u64>,
    /// Duration of the video being played; zero when unknown
    pub video_duration: Duration,
}

impl DanmakuFetchRequest {
    /// Build a request for an episode of a subject.
    pub fn new(subject: &SubjectInfo, episode: &EpisodeInfo) -> Self {
        Self {
            subject_id: subject.subject_id,
            subject_primary_name: subject.display_name.clone(),
            subject_names: subject.all_names.clone(),
            subject_publish_date: subject.air_date,
            episode_id: episode.episode_id,
            episode_sort: episode.sort.clone(),
            episode_ep: episode.ep.clone(),
            episode_name: episode.display_name(),
            filename: None,
            file_hash: Some(PLACEHOLDER_FILE_HASH.to_string()),
            file_size: None,
            video_duration: Duration::ZERO,
        }
    }

    /// Attach the local file being played.
    pub fn with_file(mut self, filename: impl Into<String>, size: Option<u64>) -> Self {
        self.filename = Some(filename.into());
        self.file_size = size;
        self
    }

    pub fn with_file_hash(mut self, hash: impl Into<String>) -> Self {
        self.file_hash = Some(hash.into());
        self
    }

    pub fn with_video_duration(mut self, duration: Duration) -> Self {
        self.video_duration = duration;
        self
    }

    /// Whether the request carries a real file hash rather than the placeholder.
    pub fn has_file_hash(&self) -> bool {
        self.file_hash
            .as_deref()
            .is_some_and(|hash| hash != PLACEHOLDER_FILE_HASH)
    }
}
