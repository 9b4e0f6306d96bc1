//! Cache storage traits.
//!
//! Abstract interface over the persisted record store, implemented by the
//! SQLite storage crate and by in-memory fakes in tests.

use async_trait::async_trait;
use chrono::Duration;

use alphastream_market_data::DataCategory;

use super::model::{CachedRecord, RefreshOutcome};
use crate::errors::Result;

/// Storage interface for cached records and the refresh outcome log.
///
/// # Design notes
///
/// - `put_record` replaces the whole record for `(category, key)`; partial
///   merges do not exist at this layer.
/// - Reads are synchronous (pooled connection, fast path); mutations are
///   async and serialized by the storage implementation.
/// - Uniqueness of `(category, key)` is the implementation's responsibility
///   (primary key in the SQLite store).
#[async_trait]
pub trait CacheStore: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Look up the record for `(category, key)`. `None` when nothing has
    /// ever been persisted for the pair.
    fn get_record(&self, category: DataCategory, key: &str) -> Result<Option<CachedRecord>>;

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Atomically replace the record for `(record.category, record.key)`.
    async fn put_record(&self, record: &CachedRecord) -> Result<()>;

    /// Append one refresh outcome to the log.
    async fn append_outcome(&self, outcome: &RefreshOutcome) -> Result<()>;

    /// Delete records of `category` not updated within `max_age`.
    /// Returns the number of deleted records.
    async fn prune(&self, category: DataCategory, max_age: Duration) -> Result<usize>;

    /// Delete outcome log rows older than `max_age`.
    /// Returns the number of deleted rows.
    async fn prune_outcomes(&self, max_age: Duration) -> Result<usize>;
}
