//! Playback session of one episode.
//!
//! Owns the danmaku loader and the statistics collector. Shutting the session
//! down cancels every outstanding provider call and ends the statistics
//! streams.

use std::sync::Arc;

use danmaku::{
    AggregateResult, AggregationError, DanmakuFetchRequest, DanmakuLoader, DanmakuLoadingState,
    DanmakuStatistics, ProviderRegistry,
};
use playback_stats::{
    StatisticsError, StatisticsInputs, StatisticsSnapshot, Subscription, VideoStatisticsCollector,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::AppConfig;

pub struct EpisodeSession {
    cancel_token: CancellationToken,
    loader: DanmakuLoader,
    statistics: VideoStatisticsCollector,
}

impl EpisodeSession {
    pub fn new(
        config: &AppConfig,
        registry: Arc<ProviderRegistry>,
        inputs: StatisticsInputs,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let loader = DanmakuLoader::new(registry, config.fetch.clone(), &cancel_token);
        let statistics = VideoStatisticsCollector::new(inputs, &config.statistics, &cancel_token);

        Self {
            cancel_token,
            loader,
            statistics,
        }
    }

    /// Load danmaku for an episode, or clear them with `None`.
    pub fn request_danmaku(&self, request: Option<DanmakuFetchRequest>) {
        self.loader.request(request);
    }

    /// Fetch again for the current request.
    pub fn reload_danmaku(&self) {
        self.loader.reload();
    }

    pub fn danmaku_state(&self) -> DanmakuLoadingState {
        self.loader.state()
    }

    pub fn subscribe_danmaku(&self) -> watch::Receiver<DanmakuLoadingState> {
        self.loader.subscribe()
    }

    /// Wait until the current request settles.
    ///
    /// Waits indefinitely while no request is set.
    pub async fn wait_for_danmaku(&self) -> Result<AggregateResult, AggregationError> {
        let mut rx = self.loader.subscribe();
        let state = rx
            .wait_for(|state| state.is_terminal())
            .await
            .map_err(|_| AggregationError::Cancelled)?
            .clone();

        match state {
            DanmakuLoadingState::Success(result) => Ok(result),
            DanmakuLoadingState::Failed(cause) => Err(cause),
            _ => Err(AggregationError::Cancelled),
        }
    }

    pub fn danmaku_statistics(&self, enabled: bool) -> DanmakuStatistics {
        DanmakuStatistics::new(enabled, self.loader.state())
    }

    /// Subscribe to playback statistics.
    pub fn statistics(&self) -> Result<Subscription<StatisticsSnapshot>, StatisticsError> {
        self.statistics.subscribe()
    }

    /// Latest statistics snapshot, without subscribing.
    pub fn statistics_value(&self) -> StatisticsSnapshot {
        self.statistics.value()
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Tear the session down.
    pub fn shutdown(&self) {
        if self.cancel_token.is_cancelled() {
            return;
        }
        info!("Shutting down episode session");
        self.cancel_token.cancel();
        self.statistics.close();
    }
}

impl Drop for EpisodeSession {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::{LocalPlayback, LocalSourceResolver};
    use crate::scripted::{ScriptedBehavior, ScriptedProviderConfig};
    use danmaku::{EpisodeInfo, ProviderOutcome, SubjectInfo};
    use playback_stats::{SourceInfoState, VideoLoadingState};
    use std::time::Duration;

    fn config(providers: Vec<(&str, u64, ScriptedBehavior)>) -> AppConfig {
        AppConfig {
            providers: providers
                .into_iter()
                .map(|(id, delay_ms, behavior)| ScriptedProviderConfig {
                    id: id.to_string(),
                    delay_ms,
                    behavior,
                })
                .collect(),
            ..Default::default()
        }
    }

    fn session(config: &AppConfig) -> (EpisodeSession, Arc<LocalPlayback>) {
        let playback = LocalPlayback::new();
        let session = EpisodeSession::new(
            config,
            Arc::new(config.registry()),
            playback.inputs(Arc::new(LocalSourceResolver)),
        );
        (session, playback)
    }

    fn request() -> DanmakuFetchRequest {
        DanmakuFetchRequest::new(
            &SubjectInfo::new(400602, "Frieren"),
            &EpisodeInfo::new(1227087, "12"),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_through_session() {
        let mut config = config(vec![
            ("a", 10, ScriptedBehavior::Succeed { count: 120 }),
            ("b", 0, ScriptedBehavior::Hang),
            ("c", 5, ScriptedBehavior::Succeed { count: 30 }),
        ]);
        config.fetch.provider_timeout_ms = 1_000;
        let (session, _) = session(&config);

        session.request_danmaku(Some(request()));
        assert!(session.danmaku_state().is_loading());

        let result = session.wait_for_danmaku().await.unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result.total_count(), 150);
        assert_eq!(result.results()[1].outcome, ProviderOutcome::TimedOut);

        let stats = session.danmaku_statistics(true);
        assert_eq!(stats.source_count(), 2);
        assert_eq!(stats.summary(), "2 sources, 150 danmaku in total");
    }

    #[tokio::test(start_paused = true)]
    async fn test_statistics_follow_local_file() {
        let (session, playback) = session(&AppConfig::default());
        let mut sub = session.statistics().unwrap();
        assert!(sub.recv().await.unwrap().is_placeholder);
        sub.recv().await;

        playback.open_file("Frieren - 12.mkv");
        let mut latest = sub.recv().await.unwrap();
        while latest.source_info().is_none()
            || !matches!(latest.video_loading_state, VideoLoadingState::Succeed { .. })
        {
            latest = sub.recv().await.unwrap();
        }

        assert_eq!(latest.playing_filename.as_deref(), Some("Frieren - 12.mkv"));
        assert_eq!(latest.source_info().unwrap().display_name, "Local file");
        assert_eq!(session.statistics_value(), latest);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_source_is_recorded() {
        let (session, playback) = session(&AppConfig::default());
        let mut sub = session.statistics().unwrap();
        sub.recv().await;
        sub.recv().await;

        playback.select(Some(playback_stats::Media::new("m1", "mikan", "a.mkv")));
        let mut latest = sub.recv().await.unwrap();
        while latest.playing_media_source_info == SourceInfoState::Pending {
            latest = sub.recv().await.unwrap();
        }
        assert!(matches!(
            latest.playing_media_source_info,
            SourceInfoState::Failed(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_everything() {
        let config = config(vec![("slow", 0, ScriptedBehavior::Hang)]);
        let (session, _) = session(&config);
        let mut sub = session.statistics().unwrap();
        sub.recv().await;
        sub.recv().await;

        session.request_danmaku(Some(request()));
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.shutdown();

        assert_eq!(
            session.wait_for_danmaku().await,
            Err(AggregationError::Cancelled)
        );
        assert!(sub.recv().await.is_none());
        assert!(session.statistics().is_err());
        assert!(session.is_shutdown());
    }
}
