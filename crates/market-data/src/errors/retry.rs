//! Retry classification for fetch errors.

/// How the fallback chain should react to a classified fetch error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryClass {
    /// Terminal: stop the whole chain, do not consult other sources.
    /// A `NotFound` from one source is definitive absence; masking it with
    /// a different source's stale guess is worse than reporting it.
    Never,

    /// Retry the same adapter a bounded number of times with linear backoff
    /// before moving on (network hiccups, timeouts).
    RetryWithBackoff,

    /// Give up on this adapter and move to the next one in the chain
    /// (rate limited, unparseable payload).
    NextSource,
}
