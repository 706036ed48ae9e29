//! Danmaku loader for the current episode.
//!
//! Wraps [`fetch_all`](crate::fetch_all) in the [`DanmakuLoadingState`]
//! machine. Each distinct request gets its own machine and its own fetch task;
//! a superseded fetch is cancelled and its result is never committed.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::registry::ProviderRegistry;
use crate::request::DanmakuFetchRequest;
use crate::state::DanmakuLoadingState;

/// The request currently being served.
#[derive(Default)]
struct CurrentRequest {
    request: Option<DanmakuFetchRequest>,
    /// Bumped on every new request; a fetch commits only if it still matches.
    generation: u64,
    /// Cancels the in-flight fetch
    cancel_token: Option<CancellationToken>,
}

struct LoaderShared {
    state_tx: watch::Sender<DanmakuLoadingState>,
    current: Mutex<CurrentRequest>,
}

/// Loads danmaku for one request at a time.
pub struct DanmakuLoader {
    registry: Arc<ProviderRegistry>,
    config: FetchConfig,
    shared: Arc<LoaderShared>,
    cancel_token: CancellationToken,
}

impl DanmakuLoader {
    /// Create a loader whose fetches are cancelled together with `parent`.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        config: FetchConfig,
        parent: &CancellationToken,
    ) -> Self {
        let (state_tx, _) = watch::channel(DanmakuLoadingState::Idle);

        Self {
            registry,
            config,
            shared: Arc::new(LoaderShared {
                state_tx,
                current: Mutex::new(CurrentRequest::default()),
            }),
            cancel_token: parent.child_token(),
        }
    }

    /// Subscribe to loading state changes.
    pub fn subscribe(&self) -> watch::Receiver<DanmakuLoadingState> {
        self.shared.state_tx.subscribe()
    }

    /// Get the current loading state.
    pub fn state(&self) -> DanmakuLoadingState {
        self.shared.state_tx.borrow().clone()
    }

    /// Get the request currently being served.
    pub fn current_request(&self) -> Option<DanmakuFetchRequest> {
        self.shared.current.lock().request.clone()
    }

    /// Request danmaku for an episode, or clear with `None`.
    ///
    /// A request equal to the current one is ignored, whatever state it is in.
    /// Use [`reload`](Self::reload) to start over after a failure.
    pub fn request(&self, request: Option<DanmakuFetchRequest>) {
        let mut current = self.shared.current.lock();
        if current.request == request {
            debug!("Ignoring duplicate danmaku request");
            return;
        }
        self.restart(&mut current, request);
    }

    /// Start a fresh fetch for the current request.
    pub fn reload(&self) {
        let mut current = self.shared.current.lock();
        let request = current.request.clone();
        self.restart(&mut current, request);
    }

    /// Cancel any in-flight fetch. Further requests will not be served.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    fn restart(&self, current: &mut CurrentRequest, request: Option<DanmakuFetchRequest>) {
        if let Some(token) = current.cancel_token.take() {
            token.cancel();
        }
        current.generation += 1;
        current.request = request.clone();

        let idle = DanmakuLoadingState::Idle;
        self.shared.state_tx.send_replace(idle.clone());

        let Some(request) = request else {
            debug!("Danmaku request cleared");
            return;
        };

        if self.cancel_token.is_cancelled() {
            debug!("Loader shut down, not fetching danmaku");
            return;
        }

        let loading = match idle.begin() {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "Could not start danmaku loading");
                return;
            }
        };
        debug!(episode_id = request.episode_id, "Danmaku loading");
        self.shared.state_tx.send_replace(loading.clone());

        let cancel_token = self.cancel_token.child_token();
        current.cancel_token = Some(cancel_token.clone());

        let generation = current.generation;
        let registry = Arc::clone(&self.registry);
        let config = self.config.clone();
        let shared = Arc::clone(&self.shared);

        tokio::spawn(async move {
            let outcome = registry
                .fetch_from_all(&request, &config, &cancel_token)
                .await;

            let current = shared.current.lock();
            if current.generation != generation {
                debug!(
                    episode_id = request.episode_id,
                    "Discarding superseded danmaku fetch"
                );
                return;
            }

            match loading.complete(outcome) {
                Ok(state) => {
                    if let DanmakuLoadingState::Failed(cause) = &state {
                        warn!(episode_id = request.episode_id, error = %cause, "Danmaku loading failed");
                    } else {
                        debug!(episode_id = request.episode_id, "Danmaku loading succeeded");
                    }
                    shared.state_tx.send_replace(state);
                }
                Err(e) => warn!(error = %e, "Could not settle danmaku loading"),
            }
        });
    }
}

impl Drop for DanmakuLoader {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}
