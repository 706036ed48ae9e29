//! Concurrent fetch across all providers.
//!
//! Every provider runs in its own task, bounded by the per-provider timeout.
//! Provider errors, panics and timeouts are recorded as [`ProviderOutcome`]s;
//! only a cancelled or broken fan-out surfaces as an [`AggregationError`].
//! The aggregate is produced once every provider has settled, in the order
//! the providers were supplied.

use std::any::Any;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tokio_util::task::AbortOnDropHandle;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::error::{AggregationError, DanmakuError};
use crate::message::Danmaku;
use crate::provider::{DanmakuProvider, ProviderFetchResult, ProviderOutcome};
use crate::request::DanmakuFetchRequest;

/// Ordered per-provider outcomes of one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    results: Vec<ProviderFetchResult>,
}

impl AggregateResult {
    pub fn new(results: Vec<ProviderFetchResult>) -> Self {
        Self { results }
    }

    /// Outcomes in provider order.
    pub fn results(&self) -> &[ProviderFetchResult] {
        &self.results
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProviderFetchResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Sum of match counts over successful providers.
    pub fn total_count(&self) -> u64 {
        self.results.iter().map(|r| r.outcome.match_count()).sum()
    }

    /// Number of providers that returned a match.
    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_success()).count()
    }

    /// Get the outcome for a provider.
    pub fn outcome(&self, provider_id: &str) -> Option<&ProviderOutcome> {
        self.results
            .iter()
            .find(|r| r.provider_id == provider_id)
            .map(|r| &r.outcome)
    }

    /// Merged danmaku from every successful provider, in provider order.
    pub fn danmaku(&self) -> impl Iterator<Item = &Danmaku> {
        self.results
            .iter()
            .filter_map(|r| r.outcome.matched())
            .flat_map(|m| m.danmaku.iter())
    }
}

impl<'a> IntoIterator for &'a AggregateResult {
    type Item = &'a ProviderFetchResult;
    type IntoIter = std::slice::Iter<'a, ProviderFetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Fetch danmaku from every provider concurrently.
///
/// Waits for all providers to settle. Cancelling `cancel` aborts every
/// outstanding provider task and returns [`AggregationError::Cancelled`].
pub async fn fetch_all(
    request: &DanmakuFetchRequest,
    providers: &[Arc<dyn DanmakuProvider>],
    config: &FetchConfig,
    cancel: &CancellationToken,
) -> Result<AggregateResult, AggregationError> {
    if providers.is_empty() {
        debug!(episode_id = request.episode_id, "No danmaku providers to fetch from");
        return Ok(AggregateResult::default());
    }

    if cancel.is_cancelled() {
        return Err(AggregationError::Cancelled);
    }

    let timeout = config.provider_timeout();
    let request = Arc::new(request.clone());
    let provider_ids: Vec<String> = providers.iter().map(|p| p.id().to_string()).collect();

    debug!(
        episode_id = request.episode_id,
        providers = provider_ids.len(),
        timeout_ms = config.provider_timeout_ms,
        "Dispatching danmaku fetch"
    );

    // Dropping a handle aborts its task, so leaving this function early
    // (cancellation) tears down every provider still running.
    let tasks: Vec<_> = providers
        .iter()
        .zip(&provider_ids)
        .map(|(provider, provider_id)| {
            let provider = Arc::clone(provider);
            let request = Arc::clone(&request);
            let provider_id = provider_id.clone();

            AbortOnDropHandle::new(tokio::spawn(async move {
                let started = Instant::now();
                let outcome =
                    match tokio::time::timeout(timeout, provider.fetch(&request, timeout)).await {
                        Ok(result) => ProviderOutcome::from(result),
                        Err(_) => ProviderOutcome::TimedOut,
                    };

                match &outcome {
                    ProviderOutcome::Success { matched } => debug!(
                        provider = %provider_id,
                        count = matched.count(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Provider matched danmaku"
                    ),
                    ProviderOutcome::Failure { cause } => {
                        warn!(provider = %provider_id, error = %cause, "Provider fetch failed")
                    }
                    ProviderOutcome::TimedOut => warn!(
                        provider = %provider_id,
                        timeout_ms = timeout.as_millis() as u64,
                        "Provider fetch timed out"
                    ),
                }

                outcome
            }))
        })
        .collect();

    let joined = tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            debug!(episode_id = request.episode_id, "Danmaku fetch cancelled");
            return Err(AggregationError::Cancelled);
        }

        joined = join_all(tasks) => joined,
    };

    let mut results = Vec::with_capacity(joined.len());
    for (provider_id, joined) in provider_ids.into_iter().zip(joined) {
        let outcome = match joined {
            Ok(outcome) => outcome,
            Err(e) if e.is_panic() => {
                let message = panic_message(e.into_panic());
                warn!(provider = %provider_id, panic = %message, "Provider task panicked");
                ProviderOutcome::Failure {
                    cause: DanmakuError::Panicked(message),
                }
            }
            Err(e) => return Err(AggregationError::TaskJoin(e.to_string())),
        };
        results.push(ProviderFetchResult {
            provider_id,
            outcome,
        });
    }

    let aggregate = AggregateResult::new(results);
    info!(
        episode_id = request.episode_id,
        sources = aggregate.success_count(),
        providers = aggregate.len(),
        total = aggregate.total_count(),
        "Danmaku fetch completed"
    );

    Ok(aggregate)
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
