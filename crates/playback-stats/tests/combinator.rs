use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use playback_stats::{
    Media, MediaSourceInfo, MediaSourceInfoResolver, PlayerSignal, ResolveError, SourceInfoState,
    StatisticsConfig, StatisticsError, StatisticsInputs, StatisticsSnapshot,
    VideoStatisticsCollector, VideoLoadingState,
};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Resolves after a per-source delay, recording started and dropped lookups.
struct SlowResolver {
    delays: HashMap<String, Duration>,
    started: Mutex<Vec<String>>,
    dropped: AtomicUsize,
}

struct DropCounter<'a>(&'a AtomicUsize, bool);

impl Drop for DropCounter<'_> {
    fn drop(&mut self) {
        if !self.1 {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl SlowResolver {
    fn new(delays: &[(&str, u64)]) -> Arc<Self> {
        Arc::new(Self {
            delays: delays
                .iter()
                .map(|(id, ms)| (id.to_string(), Duration::from_millis(*ms)))
                .collect(),
            started: Mutex::new(Vec::new()),
            dropped: AtomicUsize::new(0),
        })
    }

    fn started(&self) -> Vec<String> {
        self.started.lock().clone()
    }
}

#[async_trait]
impl MediaSourceInfoResolver for SlowResolver {
    async fn resolve(&self, media_source_id: &str) -> Result<MediaSourceInfo, ResolveError> {
        self.started.lock().push(media_source_id.to_string());
        let mut guard = DropCounter(&self.dropped, false);

        let Some(delay) = self.delays.get(media_source_id) else {
            guard.1 = true;
            return Err(ResolveError::UnknownSource(media_source_id.to_string()));
        };
        tokio::time::sleep(*delay).await;

        guard.1 = true;
        Ok(MediaSourceInfo::new(format!("{media_source_id} source")))
    }
}

struct Player {
    filename: watch::Sender<Option<String>>,
    state: watch::Sender<VideoLoadingState>,
}

impl PlayerSignal for Player {
    fn filename(&self) -> watch::Receiver<Option<String>> {
        self.filename.subscribe()
    }

    fn loading_state(&self) -> watch::Receiver<VideoLoadingState> {
        self.state.subscribe()
    }
}

struct Session {
    media: Arc<watch::Sender<Option<Media>>>,
    player: Arc<Player>,
    resolver: Arc<SlowResolver>,
    cancel: CancellationToken,
    collector: VideoStatisticsCollector,
}

fn session(resolver: Arc<SlowResolver>, grace_period_ms: u64) -> Session {
    let media = Arc::new(watch::Sender::new(None));
    let player = Arc::new(Player {
        filename: watch::Sender::new(None),
        state: watch::Sender::new(VideoLoadingState::Initial),
    });
    let cancel = CancellationToken::new();

    let inputs = StatisticsInputs {
        media_selector: media.clone(),
        source_info_resolver: resolver.clone(),
        player: player.clone(),
        media_fetch: Arc::new(watch::Sender::new(false)),
    };
    let config = StatisticsConfig {
        grace_period_ms,
        ..Default::default()
    };
    let collector = VideoStatisticsCollector::new(inputs, &config, &cancel);

    Session {
        media,
        player,
        resolver,
        cancel,
        collector,
    }
}

fn media(id: &str, source: &str) -> Option<Media> {
    Some(Media::new(id, source, format!("{id}.mkv")))
}

#[tokio::test(start_paused = true)]
async fn rapid_switch_shows_only_last_selection() {
    let s = session(SlowResolver::new(&[("slow", 100), ("fast", 10)]), 1_000);
    let mut sub = s.collector.subscribe().unwrap();
    assert!(sub.recv().await.unwrap().is_placeholder);
    sub.recv().await.unwrap();

    s.media.send_replace(media("a", "slow"));
    tokio::time::sleep(Duration::from_millis(5)).await;
    s.media.send_replace(media("b", "fast"));

    let mut seen = Vec::new();
    let deadline = tokio::time::sleep(Duration::from_millis(300));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = &mut deadline => break,
            Some(snapshot) = sub.recv() => seen.push(snapshot),
        }
    }

    let last = seen.last().unwrap();
    assert_eq!(last.playing_media, media("b", "fast"));
    assert_eq!(last.source_info().unwrap().display_name, "fast source");

    // The intermediate lookup was aborted and its result never surfaced.
    assert_eq!(s.resolver.started(), vec!["slow", "fast"]);
    assert_eq!(s.resolver.dropped.load(Ordering::SeqCst), 1);
    assert!(seen.iter().all(|snapshot| {
        snapshot
            .source_info()
            .is_none_or(|info| info.display_name != "slow source")
    }));
}

#[tokio::test(start_paused = true)]
async fn late_subscriber_receives_cached_snapshot() {
    let s = session(SlowResolver::new(&[("mikan", 10)]), 1_000);
    let mut first = s.collector.subscribe().unwrap();
    first.recv().await;
    first.recv().await;

    s.media.send_replace(media("a", "mikan"));
    first.recv().await;
    let resolved = first.recv().await.unwrap();
    assert!(resolved.source_info().is_some());

    let mut late = s.collector.subscribe().unwrap();
    let cached = late.recv().await.unwrap();
    assert!(!cached.is_placeholder);
    assert_eq!(cached, resolved);
    assert_eq!(late.latest(), resolved);
}

#[tokio::test(start_paused = true)]
async fn restart_after_grace_period_begins_with_placeholder() {
    let s = session(SlowResolver::new(&[("mikan", 10)]), 200);
    s.media.send_replace(media("a", "mikan"));

    let mut sub = s.collector.subscribe().unwrap();
    sub.recv().await;
    sub.recv().await;
    assert!(sub.recv().await.unwrap().source_info().is_some());
    drop(sub);

    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(!s.collector.is_active());
    assert_eq!(s.collector.value(), StatisticsSnapshot::PLACEHOLDER);

    let mut again = s.collector.subscribe().unwrap();
    assert_eq!(again.recv().await.unwrap(), StatisticsSnapshot::PLACEHOLDER);
    assert_eq!(
        again.recv().await.unwrap().playing_media_source_info,
        SourceInfoState::Pending
    );
    assert_eq!(s.resolver.started().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn nothing_runs_without_subscribers() {
    let s = session(SlowResolver::new(&[("mikan", 10)]), 1_000);
    s.media.send_replace(media("a", "mikan"));
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(s.resolver.started().is_empty());
    assert!(!s.collector.is_active());
    assert_eq!(s.collector.value(), StatisticsSnapshot::PLACEHOLDER);
}

#[tokio::test(start_paused = true)]
async fn deselecting_media_skips_lookup() {
    let s = session(SlowResolver::new(&[("mikan", 10)]), 1_000);
    let mut sub = s.collector.subscribe().unwrap();
    sub.recv().await;
    let first = sub.recv().await.unwrap();
    assert_eq!(first.playing_media_source_info, SourceInfoState::None);

    s.media.send_replace(media("a", "mikan"));
    sub.recv().await;
    s.media.send_replace(None);
    let cleared = sub.recv().await.unwrap();
    assert!(cleared.playing_media.is_none());
    assert_eq!(cleared.playing_media_source_info, SourceInfoState::None);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(s.resolver.started(), vec!["mikan"]);
    assert_eq!(s.collector.value().playing_media_source_info, SourceInfoState::None);
}

#[tokio::test(start_paused = true)]
async fn lookup_failure_does_not_end_stream() {
    let s = session(SlowResolver::new(&[]), 1_000);
    let mut sub = s.collector.subscribe().unwrap();
    sub.recv().await;
    sub.recv().await;

    s.media.send_replace(media("a", "unknown"));
    sub.recv().await;
    let failed = sub.recv().await.unwrap();
    assert!(matches!(
        failed.playing_media_source_info,
        SourceInfoState::Failed(_)
    ));

    s.player
        .filename
        .send_replace(Some("episode-12.mkv".to_string()));
    let next = sub.recv().await.unwrap();
    assert_eq!(next.playing_filename.as_deref(), Some("episode-12.mkv"));
}

#[tokio::test(start_paused = true)]
async fn session_cancellation_ends_streams() {
    let s = session(SlowResolver::new(&[("mikan", 10)]), 1_000);
    let mut sub = s.collector.subscribe().unwrap();
    sub.recv().await;
    sub.recv().await;

    s.cancel.cancel();
    assert!(sub.recv().await.is_none());
    assert!(matches!(
        s.collector.subscribe(),
        Err(StatisticsError::SessionClosed)
    ));
}
