//! Registry of available danmaku providers.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::aggregator::{AggregateResult, fetch_all};
use crate::config::FetchConfig;
use crate::error::AggregationError;
use crate::provider::DanmakuProvider;
use crate::request::DanmakuFetchRequest;

/// Ordered registry of danmaku providers.
///
/// Registration order is the order outcomes appear in an [`AggregateResult`].
#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn DanmakuProvider>>,
}

impl ProviderRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry from a list of providers.
    pub fn with_providers(providers: impl IntoIterator<Item = Arc<dyn DanmakuProvider>>) -> Self {
        let mut registry = Self::new();
        for provider in providers {
            registry.register(provider);
        }
        registry
    }

    /// Register a provider.
    pub fn register(&mut self, provider: Arc<dyn DanmakuProvider>) {
        self.providers.push(provider);
    }

    /// Get a provider by its ID.
    pub fn get_by_id(&self, id: &str) -> Option<Arc<dyn DanmakuProvider>> {
        self.providers
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(id))
            .cloned()
    }

    /// List all registered provider IDs.
    pub fn ids(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.id()).collect()
    }

    pub fn providers(&self) -> &[Arc<dyn DanmakuProvider>] {
        &self.providers
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Fetch from every registered provider.
    pub async fn fetch_from_all(
        &self,
        request: &DanmakuFetchRequest,
        config: &FetchConfig,
        cancel: &CancellationToken,
    ) -> Result<AggregateResult, AggregationError> {
        fetch_all(request, &self.providers, config, cancel).await
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.ids())
            .finish()
    }
}
