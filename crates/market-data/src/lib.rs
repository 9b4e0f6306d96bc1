//! AlphaStream Market Data Crate
//!
//! Provider-agnostic fetching of market data with classified errors and
//! deterministic fallback.
//!
//! # Overview
//!
//! This crate supports:
//! - Multiple data categories: quotes, bars, indices, sectors, macro series,
//!   news, earnings
//! - Multiple providers: FMP, Finnhub, FRED
//! - Per-provider sliding-window rate limiting and circuit breaking
//! - Fixed-order fallback chains per category
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Refresh core   | --> |   SourceChain    |  (fixed fallback order)
//! +------------------+     +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          |  SourceAdapter   |  (FMP, Finnhub, FRED)
//!                          +------------------+
//!                                   |
//!                                   v
//!                          +------------------+
//!                          | CategoryPayload  |  (typed records)
//!                          +------------------+
//! ```
//!
//! Every adapter failure is classified into a [`FetchError`] at the adapter
//! boundary; the chain reacts per [`errors::RetryClass`]. A `NotFound` is
//! definitive and stops the chain. Payload fields missing upstream stay
//! `None`; nothing is ever synthesized.

pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;

// Re-export the model types used throughout the workspace
pub use models::{
    BarRecord, CategoryPayload, DataCategory, EarningsRecord, IndexRecord, MacroRecord,
    NewsRecord, QuoteRecord, SectorRecord,
};

// Re-export provider types
pub use provider::finnhub::FinnhubProvider;
pub use provider::fmp::FmpProvider;
pub use provider::fred::FredProvider;
pub use provider::SourceAdapter;

// Re-export registry types
pub use registry::{
    AdapterQuota, CategoryRouting, CircuitBreaker, CircuitState, FetchSuccess,
    SlidingWindowLimiter, SourceChain,
};

// Re-export error types
pub use errors::{FetchError, RetryClass};
