//! Library target for the `ani-danmaku` binary.
//!
//! Hosts the episode session that owns the danmaku loader and the playback
//! statistics collector, the TOML configuration, and the scripted providers
//! used for dry runs.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod playback;
pub mod scripted;
pub mod session;

pub use commands::{CommandExecutor, EpisodeArgs};
pub use config::AppConfig;
pub use error::{Error, Result};
pub use playback::{LocalPlayback, LocalSourceResolver};
pub use scripted::{ScriptedBehavior, ScriptedProvider, ScriptedProviderConfig};
pub use session::EpisodeSession;
