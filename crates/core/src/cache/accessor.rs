//! Read-through cache accessor.
//!
//! The entry point consumers call. Fresh records are served straight from
//! the store; stale records are served immediately while a background
//! refresh runs (stale-while-revalidate); only a key with no record at all
//! blocks on the network.

use std::sync::Arc;

use log::warn;

use alphastream_market_data::DataCategory;

use crate::calendar::{session_state, Clock};
use crate::errors::Result;
use crate::refresh::RefreshOrchestrator;

use super::model::CachedRecord;
use super::staleness::{evaluate, Freshness};
use super::store::CacheStore;

/// Read path over the cache.
pub struct CacheAccessor {
    store: Arc<dyn CacheStore>,
    orchestrator: Arc<RefreshOrchestrator>,
    clock: Arc<dyn Clock>,
}

impl CacheAccessor {
    pub fn new(
        store: Arc<dyn CacheStore>,
        orchestrator: Arc<RefreshOrchestrator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            orchestrator,
            clock,
        }
    }

    /// Get the record for `(category, key)`.
    ///
    /// - Fresh: returned as stored, no upstream call.
    /// - Stale: returned as stored, refresh scheduled in the background.
    /// - Missing: blocks on a refresh attempt; the result always is a
    ///   record, possibly with a null payload and `fetch_error` set.
    ///
    /// Data unavailability never surfaces as an error here; only storage
    /// failures do.
    pub async fn get(&self, category: DataCategory, key: &str) -> Result<CachedRecord> {
        let now = self.clock.now();
        let record = self.store.get_record(category, key)?;
        let last_refreshed_at = record.as_ref().and_then(|r| r.last_refreshed_at);
        let verdict = evaluate(category, last_refreshed_at, session_state(now), now);

        match (record, verdict) {
            (Some(record), Freshness::Fresh) => Ok(record),
            (Some(record), Freshness::Stale) => {
                self.spawn_revalidation(category, key);
                Ok(record)
            }
            // Missing covers both no record and a record that never saw a
            // successful fetch; either way the caller has nothing to fall
            // back to, so wait for the attempt.
            _ => self.orchestrator.refresh_if_stale(category, key).await,
        }
    }

    /// Kick off a background refresh. Failures are logged, not raised;
    /// the caller already has a servable record.
    fn spawn_revalidation(&self, category: DataCategory, key: &str) {
        let orchestrator = Arc::clone(&self.orchestrator);
        let key = key.to_string();
        tokio::spawn(async move {
            if let Err(error) = orchestrator.refresh_if_stale(category, &key).await {
                warn!(
                    "background revalidation failed for {}:{}: {}",
                    category, key, error
                );
            }
        });
    }
}
