//! Source chain infrastructure: routing, rate limiting, circuit breaking.

mod chain;
mod circuit_breaker;
mod rate_limiter;
mod routing;

pub use chain::{FetchSuccess, SourceChain};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use rate_limiter::{AdapterQuota, SlidingWindowLimiter};
pub use routing::CategoryRouting;
