//! AlphaStream Core Crate
//!
//! The staleness-aware refresh engine: decides when cached market data is
//! fresh enough to serve, when to refresh it, which sources to consult, and
//! what to serve when every source fails.
//!
//! # Components
//!
//! - [`cache::staleness`]: pure freshness policy per category and session
//! - [`cache::CacheAccessor`]: read-through entry point with
//!   stale-while-revalidate semantics
//! - [`refresh::RefreshOrchestrator`]: serialized, deduplicated refresh
//!   write path with last-known-good degradation
//! - [`refresh::RefreshScheduler`]: proactive cadence trigger
//! - [`calendar`]: market session calendar and injectable clock
//!
//! Persistence and upstream providers stay behind traits
//! ([`cache::CacheStore`], [`refresh::SourceResolver`]); the SQLite store
//! and the concrete adapters live in sibling crates.

pub mod cache;
pub mod calendar;
pub mod constants;
pub mod errors;
pub mod refresh;

pub use cache::{CacheAccessor, CacheStore, CachedRecord, Freshness, RefreshOutcome};
pub use calendar::{session_state, Clock, MarketSessionState, SystemClock};
pub use errors::{DatabaseError, Error, Result};
pub use refresh::{
    cadence, PlanEntry, RefreshOrchestrator, RefreshPlan, RefreshScheduler, SourceClient,
    SourceResolver,
};

// Re-export the market-data types that appear in this crate's public API.
pub use alphastream_market_data::{CategoryPayload, DataCategory, FetchError};
