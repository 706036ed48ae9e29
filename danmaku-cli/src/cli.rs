use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "ani-danmaku", author, version, about, long_about = None)]
pub struct Args {
    /// Config file, defaults to `<config dir>/ani-danmaku/config.toml`
    #[arg(short, long, global = true, env = "ANI_DANMAKU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Per-provider timeout in milliseconds, overrides the config file
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch danmaku for an episode from every configured provider
    Fetch {
        #[arg(long)]
        subject_id: u64,

        #[arg(long)]
        subject_name: String,

        #[arg(long)]
        episode_id: u64,

        /// Sort key of the episode, e.g. `12`
        #[arg(long)]
        episode_sort: String,

        #[arg(long)]
        episode_name: Option<String>,

        /// Local file being played
        #[arg(long)]
        filename: Option<String>,

        /// Size of the local file in bytes
        #[arg(long, requires = "filename")]
        file_size: Option<u64>,

        #[arg(short, long, value_enum, default_value = "pretty")]
        output: OutputFormat,
    },

    /// List configured providers
    Providers,

    /// Show configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}
