//! Playback statistics error types.

use thiserror::Error;

/// Errors from resolving a media source's info.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Unknown media source: {0}")]
    UnknownSource(String),

    #[error("Failed to resolve media source info: {0}")]
    Failed(String),
}

impl ResolveError {
    pub fn failed(msg: impl Into<String>) -> Self {
        Self::Failed(msg.into())
    }
}

/// Errors from the statistics stream itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatisticsError {
    /// The owning session was torn down
    #[error("Playback session closed")]
    SessionClosed,
}
