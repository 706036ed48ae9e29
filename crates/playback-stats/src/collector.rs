//! Combines the playback inputs into a shared [`StatisticsSnapshot`] stream.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, warn};

use crate::config::StatisticsConfig;
use crate::error::StatisticsError;
use crate::media::Media;
use crate::shared::{Publisher, SharedState, Subscription};
use crate::snapshot::{SnapshotFields, SourceInfoState, StatisticsSnapshot};
use crate::source::{MediaSourceInfoResolver, StatisticsInputs};

/// Statistics of the video being played, computed while someone is watching.
///
/// Nothing is observed or resolved until the first [`subscribe`](Self::subscribe).
/// All subscribers share one computation.
pub struct VideoStatisticsCollector {
    shared: SharedState<StatisticsSnapshot>,
}

impl VideoStatisticsCollector {
    /// Create a collector whose streams end when `parent` is cancelled.
    pub fn new(
        inputs: StatisticsInputs,
        config: &StatisticsConfig,
        parent: &CancellationToken,
    ) -> Self {
        let shared = SharedState::new(
            "statistics",
            StatisticsSnapshot::PLACEHOLDER,
            config.grace_period(),
            config.channel_capacity,
            parent,
            Box::new(move |publisher, token| {
                run_statistics(inputs.clone(), publisher, token).boxed()
            }),
        );

        Self { shared }
    }

    /// Subscribe to snapshots.
    ///
    /// The first value received is the latest snapshot, or
    /// [`StatisticsSnapshot::PLACEHOLDER`] if none has been computed yet.
    pub fn subscribe(&self) -> Result<Subscription<StatisticsSnapshot>, StatisticsError> {
        self.shared.subscribe()
    }

    /// Latest snapshot, without subscribing.
    pub fn value(&self) -> StatisticsSnapshot {
        self.shared.value()
    }

    pub fn is_active(&self) -> bool {
        self.shared.is_active()
    }

    pub fn subscriber_count(&self) -> usize {
        self.shared.subscriber_count()
    }

    /// End all snapshot streams. Later subscriptions fail.
    pub fn close(&self) {
        self.shared.close();
    }
}

/// The source-info lookup of the current media.
///
/// Replacing the task drops, and so aborts, the previous lookup.
struct LookupSlot {
    generation: u64,
    task: Option<AbortOnDropHandle<()>>,
    resolver: Arc<dyn MediaSourceInfoResolver>,
    results: mpsc::Sender<(u64, SourceInfoState)>,
}

impl LookupSlot {
    fn switch_to(&mut self, media: Option<&Media>) -> SourceInfoState {
        self.generation += 1;
        self.task = None;

        let Some(media) = media else {
            return SourceInfoState::None;
        };

        let generation = self.generation;
        let resolver = Arc::clone(&self.resolver);
        let results = self.results.clone();
        let source_id = media.media_source_id.clone();

        debug!(generation, source_id = %source_id, "Resolving media source info");
        self.task = Some(AbortOnDropHandle::new(tokio::spawn(async move {
            let lookup = AssertUnwindSafe(resolver.resolve(&source_id)).catch_unwind();
            let state = match lookup.await {
                Ok(Ok(info)) => SourceInfoState::Resolved(info),
                Ok(Err(e)) => {
                    warn!(source_id = %source_id, error = %e, "Failed to resolve media source info");
                    SourceInfoState::Failed(e.to_string())
                }
                Err(payload) => {
                    let message = panic_message(payload);
                    warn!(source_id = %source_id, panic = %message, "Media source info lookup panicked");
                    SourceInfoState::Failed(format!("lookup panicked: {message}"))
                }
            };
            let _ = results.send((generation, state)).await;
        })));

        SourceInfoState::Pending
    }

    /// Take a finished lookup, or `None` if a newer selection superseded it.
    fn accept(&mut self, generation: u64, state: SourceInfoState) -> Option<SourceInfoState> {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Dropping stale source info");
            return None;
        }
        self.task = None;
        Some(state)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

async fn run_statistics(
    inputs: StatisticsInputs,
    publisher: Publisher<StatisticsSnapshot>,
    token: CancellationToken,
) {
    let mut media_rx = inputs.media_selector.selected();
    let mut filename_rx = inputs.player.filename();
    let mut video_state_rx = inputs.player.loading_state();
    let mut source_loading_rx = inputs.media_fetch.is_loading();

    let (results_tx, mut results_rx) = mpsc::channel(8);
    let mut lookup = LookupSlot {
        generation: 0,
        task: None,
        resolver: Arc::clone(&inputs.source_info_resolver),
        results: results_tx,
    };

    let mut fields = SnapshotFields {
        media: media_rx.borrow_and_update().clone(),
        filename: filename_rx.borrow_and_update().clone(),
        video_loading_state: video_state_rx.borrow_and_update().clone(),
        media_source_loading: *source_loading_rx.borrow_and_update(),
        ..Default::default()
    };
    fields.source_info = lookup.switch_to(fields.media.as_ref());
    publisher.publish(fields.snapshot());

    // A closed input keeps its last value.
    let mut media_open = true;
    let mut filename_open = true;
    let mut video_state_open = true;
    let mut source_loading_open = true;

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            changed = media_rx.changed(), if media_open => {
                if changed.is_err() {
                    media_open = false;
                    continue;
                }
                let media = media_rx.borrow_and_update().clone();
                if media == fields.media {
                    continue;
                }
                fields.source_info = lookup.switch_to(media.as_ref());
                fields.media = media;
            }

            Some((generation, state)) = results_rx.recv() => {
                let Some(state) = lookup.accept(generation, state) else {
                    continue;
                };
                fields.source_info = state;
            }

            changed = filename_rx.changed(), if filename_open => {
                if changed.is_err() {
                    filename_open = false;
                    continue;
                }
                fields.filename = filename_rx.borrow_and_update().clone();
            }

            changed = video_state_rx.changed(), if video_state_open => {
                if changed.is_err() {
                    video_state_open = false;
                    continue;
                }
                fields.video_loading_state = video_state_rx.borrow_and_update().clone();
            }

            changed = source_loading_rx.changed(), if source_loading_open => {
                if changed.is_err() {
                    source_loading_open = false;
                    continue;
                }
                fields.media_source_loading = *source_loading_rx.borrow_and_update();
            }
        }

        if !publisher.publish(fields.snapshot()) {
            break;
        }
    }

    debug!("Statistics producer stopped");
}
