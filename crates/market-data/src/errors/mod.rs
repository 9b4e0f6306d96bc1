//! Error taxonomy for upstream data fetching.
//!
//! Every failure inside a source adapter is caught and classified into a
//! [`FetchError`] at the adapter boundary; raw transport errors never cross
//! into the fallback chain. The [`retry_class`](FetchError::retry_class)
//! method tells the chain how to proceed.

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Classified error from a source adapter or the fallback chain.
#[derive(Error, Debug, Clone)]
pub enum FetchError {
    /// The provider rejected the call because its quota is exhausted
    /// (HTTP 429, or a provider-specific quota signal).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The adapter that was rate limited.
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The adapter that timed out.
        provider: String,
    },

    /// A transport-level failure (connection refused, DNS, TLS, 5xx).
    #[error("Network error: {provider} - {message}")]
    Network {
        /// The adapter that failed.
        provider: String,
        /// Short description of the transport failure.
        message: String,
    },

    /// The key has no data at this provider. Absence is definitive, so the
    /// chain stops here rather than asking another source to guess.
    #[error("Not found: {key}")]
    NotFound {
        /// The natural key that has no data.
        key: String,
    },

    /// The provider answered but the payload did not parse.
    #[error("Malformed payload from {provider}: {message}")]
    Malformed {
        /// The adapter whose payload failed to parse.
        provider: String,
        /// Parse failure description.
        message: String,
    },

    /// No adapter in the chain covers the requested category.
    #[error("No sources available")]
    NoSourcesAvailable,

    /// Every adapter in the chain was tried and all failed.
    #[error("All sources failed")]
    AllSourcesFailed,
}

impl FetchError {
    /// Classify this error for the fallback chain.
    pub fn retry_class(&self) -> RetryClass {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => RetryClass::RetryWithBackoff,
            Self::RateLimited { .. } | Self::Malformed { .. } => RetryClass::NextSource,
            Self::NotFound { .. } | Self::NoSourcesAvailable | Self::AllSourcesFailed => {
                RetryClass::Never
            }
        }
    }

    /// Whether this failure should count against the adapter's circuit.
    pub fn trips_circuit(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Network { .. }
        )
    }
}
