//! Facade over the market-data source chain.
//!
//! The orchestrator depends on the [`SourceResolver`] trait rather than the
//! chain directly so tests can substitute programmable resolvers.

use async_trait::async_trait;
use std::sync::Arc;

use alphastream_market_data::{
    CategoryRouting, DataCategory, FetchError, FetchSuccess, SourceAdapter, SourceChain,
};

/// Upstream resolution seam used by the refresh orchestrator.
#[async_trait]
pub trait SourceResolver: Send + Sync {
    /// Resolve `(category, key)` against upstream sources.
    async fn resolve(&self, category: DataCategory, key: &str)
        -> Result<FetchSuccess, FetchError>;
}

/// Production resolver: the fallback chain over the configured adapters.
pub struct SourceClient {
    chain: SourceChain,
}

impl SourceClient {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, routing: CategoryRouting) -> Self {
        Self {
            chain: SourceChain::new(adapters, routing),
        }
    }
}

#[async_trait]
impl SourceResolver for SourceClient {
    async fn resolve(
        &self,
        category: DataCategory,
        key: &str,
    ) -> Result<FetchSuccess, FetchError> {
        self.chain.resolve(category, key).await
    }
}
