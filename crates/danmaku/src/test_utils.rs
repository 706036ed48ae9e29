//! Fake providers shared by the unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{DanmakuError, Result};
use crate::message::{Danmaku, DanmakuMatch, DanmakuMatchMethod};
use crate::provider::DanmakuProvider;
use crate::request::{DanmakuFetchRequest, EpisodeInfo, SubjectInfo};

pub(crate) fn request() -> DanmakuFetchRequest {
    DanmakuFetchRequest::new(
        &SubjectInfo::new(400602, "Frieren"),
        &EpisodeInfo::new(1227087, "12"),
    )
}

pub(crate) fn request_for_episode(episode_id: u64) -> DanmakuFetchRequest {
    DanmakuFetchRequest::new(
        &SubjectInfo::new(400602, "Frieren"),
        &EpisodeInfo::new(episode_id, episode_id.to_string()),
    )
}

#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    Succeed(u64),
    Fail(DanmakuError),
    Hang,
    Panic,
}

/// Counts fetch futures dropped before they finished.
struct CancelGuard {
    cancelled: Arc<AtomicUsize>,
    completed: bool,
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        if !self.completed {
            self.cancelled.fetch_add(1, Ordering::SeqCst);
        }
    }
}

pub(crate) struct FakeProvider {
    id: String,
    delay: Duration,
    behavior: Behavior,
    calls: AtomicUsize,
    cancelled: Arc<AtomicUsize>,
}

impl FakeProvider {
    pub(crate) fn new(id: &str, delay: Duration, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            delay,
            behavior,
            calls: AtomicUsize::new(0),
            cancelled: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn cancelled(&self) -> usize {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DanmakuProvider for FakeProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(
        &self,
        _request: &DanmakuFetchRequest,
        _timeout: Duration,
    ) -> Result<DanmakuMatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut guard = CancelGuard {
            cancelled: Arc::clone(&self.cancelled),
            completed: false,
        };

        tokio::time::sleep(self.delay).await;

        let result = match &self.behavior {
            Behavior::Succeed(count) => {
                let danmaku = (0..*count)
                    .map(|i| Danmaku::new(i.to_string(), &self.id, i * 1000, "test"))
                    .collect();
                Ok(DanmakuMatch::new(&self.id, DanmakuMatchMethod::Exact, danmaku))
            }
            Behavior::Fail(error) => Err(error.clone()),
            Behavior::Hang => std::future::pending::<Result<DanmakuMatch>>().await,
            Behavior::Panic => panic!("provider exploded"),
        };

        guard.completed = true;
        result
    }
}
