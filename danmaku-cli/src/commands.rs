use std::sync::Arc;

use danmaku::{DanmakuFetchRequest, EpisodeInfo, SubjectInfo};
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output;
use crate::playback::{LocalPlayback, LocalSourceResolver};
use crate::session::EpisodeSession;

/// Episode to fetch danmaku for, as given on the command line.
#[derive(Debug, Clone)]
pub struct EpisodeArgs {
    pub subject_id: u64,
    pub subject_name: String,
    pub episode_id: u64,
    pub episode_sort: String,
    pub episode_name: Option<String>,
    pub filename: Option<String>,
    pub file_size: Option<u64>,
}

impl EpisodeArgs {
    pub fn request(&self) -> DanmakuFetchRequest {
        let subject = SubjectInfo::new(self.subject_id, &self.subject_name);
        let mut episode = EpisodeInfo::new(self.episode_id, &self.episode_sort);
        if let Some(name) = &self.episode_name {
            episode = episode.with_name(name);
        }

        let request = DanmakuFetchRequest::new(&subject, &episode);
        match &self.filename {
            Some(filename) => request.with_file(filename, self.file_size),
            None => request,
        }
    }
}

pub struct CommandExecutor {
    config: AppConfig,
}

impl CommandExecutor {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Create a session over the configured providers and local playback.
    pub fn open_session(&self) -> (EpisodeSession, Arc<LocalPlayback>) {
        let playback = LocalPlayback::new();
        let session = EpisodeSession::new(
            &self.config,
            Arc::new(self.config.registry()),
            playback.inputs(Arc::new(LocalSourceResolver)),
        );
        (session, playback)
    }

    /// Fetch danmaku for one episode and render the outcome.
    ///
    /// Ctrl-C shuts the session down, cancelling the outstanding providers.
    pub async fn fetch(&self, episode: &EpisodeArgs, format: OutputFormat) -> Result<String> {
        let (session, playback) = self.open_session();
        let _statistics = session.statistics()?;

        if let Some(filename) = &episode.filename {
            playback.open_file(filename);
        }

        let request = episode.request();
        info!(
            subject_id = request.subject_id,
            episode_id = request.episode_id,
            providers = self.config.providers.len(),
            "Fetching danmaku"
        );
        session.request_danmaku(Some(request));

        let result = tokio::select! {
            result = session.wait_for_danmaku() => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, cancelling outstanding providers");
                session.shutdown();
                session.wait_for_danmaku().await
            }
        }?;

        let rendered = output::format_fetch(
            &result,
            &session.danmaku_statistics(true),
            &session.statistics_value(),
            format,
        )?;
        session.shutdown();
        Ok(rendered)
    }

    pub fn list_providers(&self) -> String {
        output::format_providers(&self.config.registry())
    }

    pub fn show_config(&self) -> Result<String> {
        self.config.show()
    }
}
