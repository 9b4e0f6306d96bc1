//! Cached record model, staleness policy, storage traits, and the
//! read-through accessor.

pub mod accessor;
pub mod model;
pub mod staleness;
pub mod store;

pub use accessor::CacheAccessor;
pub use model::{CachedRecord, RefreshOutcome};
pub use staleness::{evaluate, threshold, Freshness};
pub use store::CacheStore;
