//! Danmaku error types.

use thiserror::Error;

/// Crate-specific result type.
pub type Result<T> = std::result::Result<T, DanmakuError>;

/// Errors a single provider call can produce.
///
/// These never escape [`fetch_all`](crate::fetch_all): they are recorded as
/// [`ProviderOutcome::Failure`](crate::ProviderOutcome::Failure) for the provider
/// that produced them.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DanmakuError {
    /// Network or transport errors (HTTP, WebSocket, DNS, ...)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Malformed or unexpected provider response
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The provider has nothing for this episode
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider task panicked
    #[error("Provider task panicked: {0}")]
    Panicked(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl DanmakuError {
    /// Create a transport error.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a protocol error.
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a not-found error.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a generic error.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Errors that prevent an aggregate from being produced at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// The owning session cancelled the fan-out
    #[error("Aggregation cancelled")]
    Cancelled,

    /// The runtime could not drive a provider task to completion
    #[error("Provider task could not be joined: {0}")]
    TaskJoin(String),
}

/// Errors raised by the loading state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StateError {
    #[error("Invalid state transition: cannot transition from {from} to {to}")]
    InvalidTransition { from: &'static str, to: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            DanmakuError::transport("connection reset").to_string(),
            "Transport error: connection reset"
        );
        assert_eq!(DanmakuError::other("boom").to_string(), "boom");
        assert_eq!(
            AggregationError::Cancelled.to_string(),
            "Aggregation cancelled"
        );
    }

    #[test]
    fn test_invalid_transition_display() {
        let err = StateError::InvalidTransition {
            from: "success",
            to: "loading",
        };
        assert_eq!(
            err.to_string(),
            "Invalid state transition: cannot transition from success to loading"
        );
    }
}
