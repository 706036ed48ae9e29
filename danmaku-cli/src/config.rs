use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use danmaku::{DanmakuProvider, FetchConfig, ProviderRegistry};
use playback_stats::StatisticsConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::scripted::{ScriptedProvider, ScriptedProviderConfig};

const APP_DIR: &str = "ani-danmaku";
const CONFIG_FILE: &str = "config.toml";

/// Application configuration, read from a TOML file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// `EnvFilter` directives used when neither `--verbose` nor `--quiet` is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
    pub fetch: FetchConfig,
    pub statistics: StatisticsConfig,
    pub providers: Vec<ScriptedProviderConfig>,
}

impl AppConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the config from `path`, or from the default location.
    ///
    /// A missing file at the default location yields the defaults; a missing
    /// file that was asked for explicitly is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::config(format!(
                        "config file not found: {}",
                        path.display()
                    )));
                }
                path.to_path_buf()
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        debug!(path = %path.display(), "Loading config");
        let content = fs::read_to_string(&path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.fetch.provider_timeout_ms == 0 {
            return Err(Error::config("fetch.provider_timeout_ms must be positive"));
        }

        let mut seen = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            let id = provider.id.to_lowercase();
            if id.is_empty() {
                return Err(Error::config("provider id must not be empty"));
            }
            if seen.contains(&id) {
                return Err(Error::config(format!("duplicate provider id: {}", provider.id)));
            }
            seen.push(id);
        }
        Ok(())
    }

    /// The effective configuration as TOML.
    pub fn show(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Registry of the configured providers, in file order.
    pub fn registry(&self) -> ProviderRegistry {
        ProviderRegistry::with_providers(
            self.providers
                .iter()
                .map(|p| Arc::new(ScriptedProvider::new(p)) as Arc<dyn DanmakuProvider>),
        )
    }
}
