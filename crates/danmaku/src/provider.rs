//! Danmaku provider trait and outcome types.
//!
//! Defines the interface for provider-specific danmaku clients and the value
//! recorded for each provider after an aggregation run.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::{DanmakuError, Result};
use crate::message::DanmakuMatch;
use crate::request::DanmakuFetchRequest;

/// Trait for provider-specific danmaku clients.
///
/// Retry and rate limiting are the provider's own business. The aggregator
/// bounds every call by the timeout it passes in, and drops the future when
/// that budget runs out, so implementations must not rely on running to
/// completion.
#[async_trait]
pub trait DanmakuProvider: Send + Sync {
    /// Get the identifier of this provider.
    fn id(&self) -> &str;

    /// Fetch danmaku matching the request.
    async fn fetch(&self, request: &DanmakuFetchRequest, timeout: Duration)
    -> Result<DanmakuMatch>;
}

/// What happened to one provider during an aggregation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProviderOutcome {
    Success { matched: DanmakuMatch },
    Failure {
        #[serde(serialize_with = "serialize_cause")]
        cause: DanmakuError,
    },
    TimedOut,
}

fn serialize_cause<S: serde::Serializer>(
    cause: &DanmakuError,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_str(cause)
}

impl ProviderOutcome {
    /// Number of matched danmaku, zero unless the provider succeeded.
    pub fn match_count(&self) -> u64 {
        match self {
            Self::Success { matched } => matched.count(),
            Self::Failure { .. } | Self::TimedOut => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn matched(&self) -> Option<&DanmakuMatch> {
        match self {
            Self::Success { matched } => Some(matched),
            _ => None,
        }
    }
}

impl From<Result<DanmakuMatch>> for ProviderOutcome {
    fn from(result: Result<DanmakuMatch>) -> Self {
        match result {
            Ok(matched) => Self::Success { matched },
            Err(cause) => Self::Failure { cause },
        }
    }
}

/// Outcome of one provider, tagged with the provider's ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderFetchResult {
    pub provider_id: String,
    pub outcome: ProviderOutcome,
}
