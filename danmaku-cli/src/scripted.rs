//! Providers whose answers come from the config file.
//!
//! Used for dry runs of the fetch pipeline without any network access.

use std::time::Duration;

use async_trait::async_trait;
use danmaku::{
    Danmaku, DanmakuError, DanmakuFetchRequest, DanmakuLocation, DanmakuMatch, DanmakuMatchMethod,
    DanmakuProvider,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a scripted provider answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScriptedBehavior {
    /// Match `count` danmaku
    Succeed { count: u64 },
    /// Fail with a transport error
    Fail { message: String },
    /// Never answer
    Hang,
}

/// A `[[providers]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedProviderConfig {
    pub id: String,
    #[serde(default)]
    pub delay_ms: u64,
    pub behavior: ScriptedBehavior,
}

pub struct ScriptedProvider {
    id: String,
    delay: Duration,
    behavior: ScriptedBehavior,
}

impl ScriptedProvider {
    pub fn new(config: &ScriptedProviderConfig) -> Self {
        Self {
            id: config.id.clone(),
            delay: Duration::from_millis(config.delay_ms),
            behavior: config.behavior.clone(),
        }
    }

    /// Spread `count` danmaku over the video, one per second if its length is unknown.
    fn generate(&self, request: &DanmakuFetchRequest, count: u64) -> Vec<Danmaku> {
        let duration_ms = request.video_duration.as_millis() as u64;
        let step_ms = match duration_ms.checked_div(count) {
            Some(step) if step > 0 => step,
            _ => 1_000,
        };

        (0..count)
            .map(|i| {
                let location = match i % 10 {
                    0 => DanmakuLocation::Top,
                    9 => DanmakuLocation::Bottom,
                    _ => DanmakuLocation::Normal,
                };
                Danmaku::new(
                    format!("{}-{}-{}", self.id, request.episode_id, i),
                    &self.id,
                    i * step_ms,
                    format!("{} #{}", request.episode_name, i + 1),
                )
                .with_location(location)
            })
            .collect()
    }
}

#[async_trait]
impl DanmakuProvider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    async fn fetch(
        &self,
        request: &DanmakuFetchRequest,
        _timeout: Duration,
    ) -> danmaku::Result<DanmakuMatch> {
        debug!(provider = %self.id, delay_ms = self.delay.as_millis() as u64, "Scripted fetch");
        tokio::time::sleep(self.delay).await;

        match &self.behavior {
            ScriptedBehavior::Succeed { count: 0 } => Ok(DanmakuMatch::no_match(&self.id)),
            ScriptedBehavior::Succeed { count } => Ok(DanmakuMatch::new(
                &self.id,
                DanmakuMatchMethod::Exact,
                self.generate(request, *count),
            )),
            ScriptedBehavior::Fail { message } => Err(DanmakuError::transport(message.clone())),
            ScriptedBehavior::Hang => std::future::pending().await,
        }
    }
}
