//! Fallback chain over source adapters.
//!
//! For each category the chain walks its configured adapters in fixed
//! priority order until one produces a payload:
//! - `RetryWithBackoff` errors (timeout, network) get a bounded per-adapter
//!   retry budget with linear backoff before the chain moves on;
//! - `NextSource` errors (rate limited, malformed) advance immediately;
//! - `NotFound` stops the whole chain; one source's definitive absence is
//!   not masked by another source's guess;
//! - adapters with an open circuit are skipped.
//!
//! The chain is storage-agnostic: falling back to the last-known-good record
//! on total failure is the refresh orchestrator's job, because that is where
//! the store lives.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::errors::{FetchError, RetryClass};
use crate::models::{CategoryPayload, DataCategory};
use crate::provider::SourceAdapter;

use super::circuit_breaker::CircuitBreaker;
use super::routing::CategoryRouting;

/// Per-adapter retry budget for transient errors.
const MAX_ATTEMPTS_PER_SOURCE: u32 = 3;

/// Base for linear backoff between attempts: 1s, 2s.
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// A successfully resolved payload with its provenance.
#[derive(Debug, Clone)]
pub struct FetchSuccess {
    pub payload: CategoryPayload,
    /// Id of the adapter that produced the payload.
    pub source: String,
}

/// Walks the configured adapter chain for a category.
pub struct SourceChain {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    routing: CategoryRouting,
    circuit_breaker: CircuitBreaker,
    backoff_base: Duration,
}

impl SourceChain {
    pub fn new(adapters: Vec<Arc<dyn SourceAdapter>>, routing: CategoryRouting) -> Self {
        Self {
            adapters,
            routing,
            circuit_breaker: CircuitBreaker::new(),
            backoff_base: BACKOFF_BASE,
        }
    }

    /// Mainly for tests: a chain that does not sleep between retries.
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Adapters routed for this category, in configured order, limited to
    /// adapters that declare support for it.
    fn ordered_adapters(&self, category: DataCategory) -> Vec<&Arc<dyn SourceAdapter>> {
        self.routing
            .sources_for(category)
            .iter()
            .filter_map(|id| {
                self.adapters
                    .iter()
                    .find(|a| a.id() == id && a.supported_categories().contains(&category))
            })
            .collect()
    }

    /// Resolve one `(category, key)` against the chain.
    pub async fn resolve(
        &self,
        category: DataCategory,
        key: &str,
    ) -> Result<FetchSuccess, FetchError> {
        let adapters = self.ordered_adapters(category);

        if adapters.is_empty() {
            warn!("no sources routed for category '{}'", category);
            return Err(FetchError::NoSourcesAvailable);
        }

        let mut last_error: Option<FetchError> = None;

        for adapter in adapters {
            let source = adapter.id();

            if !self.circuit_breaker.is_allowed(source) {
                debug!("circuit open for '{}', skipping", source);
                continue;
            }

            match self.try_source(adapter.as_ref(), category, key).await {
                Ok(payload) => {
                    self.circuit_breaker.record_success(source);
                    debug!("'{}' resolved {}:{}", source, category, key);
                    return Ok(FetchSuccess {
                        payload,
                        source: source.to_string(),
                    });
                }
                Err(error) => {
                    if error.trips_circuit() {
                        self.circuit_breaker.record_failure(source);
                    }
                    if error.retry_class() == RetryClass::Never {
                        // Definitive absence; do not consult further sources.
                        return Err(error);
                    }
                    debug!(
                        "'{}' failed for {}:{} ({}), trying next source",
                        source, category, key, error
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::AllSourcesFailed))
    }

    /// One adapter with its retry budget. Transient errors retry with
    /// linear backoff; everything else returns immediately.
    async fn try_source(
        &self,
        adapter: &dyn SourceAdapter,
        category: DataCategory,
        key: &str,
    ) -> Result<CategoryPayload, FetchError> {
        let mut last_error: Option<FetchError> = None;

        for attempt in 0..MAX_ATTEMPTS_PER_SOURCE {
            if attempt > 0 {
                tokio::time::sleep(self.backoff_base * attempt).await;
            }

            match adapter.fetch(category, key).await {
                Ok(payload) => {
                    if !payload.matches(category) {
                        // Wrong payload shape is a provider bug, not data.
                        return Err(FetchError::Malformed {
                            provider: adapter.id().to_string(),
                            message: format!("payload variant does not match {}", category),
                        });
                    }
                    return Ok(payload);
                }
                Err(error) => {
                    if error.retry_class() != RetryClass::RetryWithBackoff {
                        return Err(error);
                    }
                    debug!(
                        "attempt {}/{} on '{}' failed: {}",
                        attempt + 1,
                        MAX_ATTEMPTS_PER_SOURCE,
                        adapter.id(),
                        error
                    );
                    last_error = Some(error);
                }
            }
        }

        Err(last_error.unwrap_or(FetchError::AllSourcesFailed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuoteRecord;
    use crate::registry::AdapterQuota;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// What a mock adapter should do on each call.
    #[derive(Clone, Copy)]
    enum MockBehavior {
        Succeed,
        FailTransient,
        FailRateLimited,
        FailNotFound,
        FailMalformed,
    }

    struct MockAdapter {
        id: &'static str,
        behavior: MockBehavior,
        call_count: AtomicUsize,
    }

    impl MockAdapter {
        fn new(id: &'static str, behavior: MockBehavior) -> Arc<Self> {
            Arc::new(Self {
                id,
                behavior,
                call_count: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SourceAdapter for MockAdapter {
        fn id(&self) -> &'static str {
            self.id
        }

        fn supported_categories(&self) -> &'static [DataCategory] {
            &[DataCategory::EquityQuote]
        }

        fn quota(&self) -> AdapterQuota {
            AdapterQuota::default()
        }

        async fn fetch(
            &self,
            _category: DataCategory,
            key: &str,
        ) -> Result<CategoryPayload, FetchError> {
            self.call_count.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                MockBehavior::Succeed => Ok(CategoryPayload::Quote(QuoteRecord {
                    symbol: key.to_string(),
                    name: None,
                    price: Some(dec!(100)),
                    change: None,
                    change_percent: None,
                    open: None,
                    previous_close: None,
                    day_low: None,
                    day_high: None,
                    year_low: None,
                    year_high: None,
                    volume: None,
                    market_cap: None,
                    quoted_at: None,
                })),
                MockBehavior::FailTransient => Err(FetchError::Network {
                    provider: self.id.to_string(),
                    message: "connection reset".to_string(),
                }),
                MockBehavior::FailRateLimited => Err(FetchError::RateLimited {
                    provider: self.id.to_string(),
                }),
                MockBehavior::FailNotFound => Err(FetchError::NotFound {
                    key: key.to_string(),
                }),
                MockBehavior::FailMalformed => Err(FetchError::Malformed {
                    provider: self.id.to_string(),
                    message: "expected array".to_string(),
                }),
            }
        }
    }

    fn chain_for(adapters: Vec<Arc<dyn SourceAdapter>>, order: &[&str]) -> SourceChain {
        let mut routing = CategoryRouting::defaults();
        routing.set(
            DataCategory::EquityQuote,
            order.iter().map(|s| s.to_string()).collect(),
        );
        SourceChain::new(adapters, routing).with_backoff_base(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_fallback_order_respected() {
        let a = MockAdapter::new("A", MockBehavior::FailTransient);
        let b = MockAdapter::new("B", MockBehavior::Succeed);
        let chain = chain_for(vec![a.clone() as Arc<dyn SourceAdapter>, b.clone()], &["A", "B"]);

        let success = chain
            .resolve(DataCategory::EquityQuote, "AAPL")
            .await
            .unwrap();

        assert_eq!(success.source, "B");
        // A exhausted its full retry budget before the chain moved on.
        assert_eq!(a.calls(), MAX_ATTEMPTS_PER_SOURCE as usize);
        assert_eq!(b.calls(), 1);
    }

    #[tokio::test]
    async fn test_not_found_short_circuits_chain() {
        let a = MockAdapter::new("A", MockBehavior::FailNotFound);
        let b = MockAdapter::new("B", MockBehavior::Succeed);
        let chain = chain_for(vec![a.clone() as Arc<dyn SourceAdapter>, b.clone()], &["A", "B"]);

        let error = chain
            .resolve(DataCategory::EquityQuote, "ZZZ")
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::NotFound { .. }));
        assert_eq!(a.calls(), 1);
        // B must never be consulted after a definitive absence.
        assert_eq!(b.calls(), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_advances_without_retry() {
        let a = MockAdapter::new("A", MockBehavior::FailRateLimited);
        let b = MockAdapter::new("B", MockBehavior::Succeed);
        let chain = chain_for(vec![a.clone() as Arc<dyn SourceAdapter>, b.clone()], &["A", "B"]);

        let success = chain
            .resolve(DataCategory::EquityQuote, "AAPL")
            .await
            .unwrap();

        assert_eq!(success.source, "B");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_advances_to_next_source() {
        let a = MockAdapter::new("A", MockBehavior::FailMalformed);
        let b = MockAdapter::new("B", MockBehavior::Succeed);
        let chain = chain_for(vec![a.clone() as Arc<dyn SourceAdapter>, b.clone()], &["A", "B"]);

        let success = chain
            .resolve(DataCategory::EquityQuote, "AAPL")
            .await
            .unwrap();
        assert_eq!(success.source, "B");
        assert_eq!(a.calls(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_chain_returns_last_error() {
        let a = MockAdapter::new("A", MockBehavior::FailTransient);
        let b = MockAdapter::new("B", MockBehavior::FailRateLimited);
        let chain = chain_for(vec![a.clone() as Arc<dyn SourceAdapter>, b.clone()], &["A", "B"]);

        let error = chain
            .resolve(DataCategory::EquityQuote, "AAPL")
            .await
            .unwrap_err();

        assert!(matches!(error, FetchError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_unrouted_category_has_no_sources() {
        let a = MockAdapter::new("A", MockBehavior::Succeed);
        let mut routing = CategoryRouting::defaults();
        routing.set(DataCategory::EquityQuote, vec![]);
        let chain = SourceChain::new(vec![a as Arc<dyn SourceAdapter>], routing);

        let error = chain
            .resolve(DataCategory::EquityQuote, "AAPL")
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::NoSourcesAvailable));
    }

    #[tokio::test]
    async fn test_adapter_without_category_support_is_skipped() {
        // Routed but does not declare EquityEodBar support.
        let a = MockAdapter::new("A", MockBehavior::Succeed);
        let mut routing = CategoryRouting::defaults();
        routing.set(DataCategory::EquityEodBar, vec!["A".to_string()]);
        let chain = SourceChain::new(vec![a as Arc<dyn SourceAdapter>], routing);

        let error = chain
            .resolve(DataCategory::EquityEodBar, "AAPL")
            .await
            .unwrap_err();
        assert!(matches!(error, FetchError::NoSourcesAvailable));
    }
}
