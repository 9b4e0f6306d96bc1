//! Source adapter trait definition and concrete provider implementations.

pub mod finnhub;
pub mod fmp;
pub mod fred;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{CategoryPayload, DataCategory};
use crate::registry::AdapterQuota;

/// Uniform interface to one upstream data provider.
///
/// Implementations classify every failure into a [`FetchError`] before it
/// leaves the adapter, and enforce their own outbound quota with a sliding
/// 60-second window. Quotas are per-provider, so the guard belongs here,
/// not in the orchestrator.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use alphastream_market_data::provider::SourceAdapter;
///
/// struct MyProvider { api_key: String }
///
/// #[async_trait]
/// impl SourceAdapter for MyProvider {
///     fn id(&self) -> &'static str { "MY_PROVIDER" }
///
///     fn supported_categories(&self) -> &'static [DataCategory] {
///         &[DataCategory::EquityQuote]
///     }
///
///     fn quota(&self) -> AdapterQuota { AdapterQuota::default() }
///
///     // ... implement fetch
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique identifier, e.g. "FMP", "FINNHUB", "FRED". Used for
    /// provenance tagging, circuit tracking, and logging.
    fn id(&self) -> &'static str;

    /// Categories this adapter can serve. The chain filters on this before
    /// consulting the routing table.
    fn supported_categories(&self) -> &'static [DataCategory];

    /// Declared outbound quota (sliding 60-second window).
    fn quota(&self) -> AdapterQuota;

    /// Fetch the payload for one `(category, key)` pair.
    ///
    /// The returned payload variant must match the category. Implementations
    /// wait on their own rate limiter before issuing the request.
    async fn fetch(
        &self,
        category: DataCategory,
        key: &str,
    ) -> Result<CategoryPayload, FetchError>;
}
