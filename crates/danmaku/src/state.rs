//! Loading state machine for one danmaku fetch.
//!
//! ```text
//! Idle --begin--> Loading --complete(Ok)--> Success
//!                         --complete(Err)-> Failed
//! ```
//!
//! `Success` and `Failed` are terminal. A new request starts a new machine
//! from `Idle`; nothing moves out of a terminal state. Providers that failed
//! or timed out inside a `Success` aggregate are data, not a `Failed` state.

use crate::aggregator::AggregateResult;
use crate::error::{AggregationError, StateError};

/// Loading state of the danmaku for the current episode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DanmakuLoadingState {
    /// No fetch requested
    #[default]
    Idle,
    /// Fetch dispatched, waiting for every provider to settle
    Loading,
    /// Every provider settled
    Success(AggregateResult),
    /// The fan-out itself failed
    Failed(AggregationError),
}

impl DanmakuLoadingState {
    /// Get the state name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Failed(_))
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The aggregate, if loading succeeded.
    pub fn result(&self) -> Option<&AggregateResult> {
        match self {
            Self::Success(result) => Some(result),
            _ => None,
        }
    }

    /// The fan-out error, if loading failed.
    pub fn error(&self) -> Option<&AggregationError> {
        match self {
            Self::Failed(cause) => Some(cause),
            _ => None,
        }
    }

    /// Move from `Idle` to `Loading`.
    pub fn begin(&self) -> Result<Self, StateError> {
        match self {
            Self::Idle => Ok(Self::Loading),
            other => Err(StateError::InvalidTransition {
                from: other.name(),
                to: "loading",
            }),
        }
    }

    /// Settle a `Loading` state with the outcome of the fan-out.
    pub fn complete(
        &self,
        outcome: Result<AggregateResult, AggregationError>,
    ) -> Result<Self, StateError> {
        let next = match outcome {
            Ok(result) => Self::Success(result),
            Err(cause) => Self::Failed(cause),
        };

        match self {
            Self::Loading => Ok(next),
            other => Err(StateError::InvalidTransition {
                from: other.name(),
                to: next.name(),
            }),
        }
    }
}
