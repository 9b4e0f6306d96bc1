//! Refresh orchestrator.
//!
//! Owns the write path of the cache: resolves `(category, key)` through the
//! fallback chain, persists the resulting record, and appends an outcome log
//! row. Guarantees at most one in-flight refresh per key: concurrent
//! callers wait for the running attempt and reuse its result instead of
//! issuing duplicate upstream calls, which is what protects provider quotas
//! under concurrent read pressure.
//!
//! Failure never escapes as an error: an exhausted chain degrades to the
//! last-known-good record annotated with `fetch_error`, or to an explicit
//! absent record when nothing was ever fetched.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use log::{debug, warn};
use tokio::sync::Mutex;

use alphastream_market_data::DataCategory;

use crate::cache::{evaluate, CacheStore, CachedRecord, Freshness, RefreshOutcome};
use crate::calendar::{session_state, Clock};
use crate::errors::Result;

use super::client::SourceResolver;

/// Serializes refreshes per `(category, key)` and persists their results.
pub struct RefreshOrchestrator {
    store: Arc<dyn CacheStore>,
    resolver: Arc<dyn SourceResolver>,
    clock: Arc<dyn Clock>,
    /// Per-key refresh locks. Entries are tiny and the keyspace is bounded
    /// by the tracked universe, so they are never evicted.
    in_flight: DashMap<String, Arc<Mutex<()>>>,
}

impl RefreshOrchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        resolver: Arc<dyn SourceResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            resolver,
            clock,
            in_flight: DashMap::new(),
        }
    }

    fn slot(&self, category: DataCategory, key: &str) -> Arc<Mutex<()>> {
        self.in_flight
            .entry(format!("{}:{}", category, key))
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Refresh unless a concurrent attempt already made the record fresh.
    ///
    /// This is the on-demand entry point: callers racing on the same key
    /// queue on the per-key lock, and every waiter after the winner finds a
    /// fresh record and returns it without touching upstream.
    pub async fn refresh_if_stale(
        &self,
        category: DataCategory,
        key: &str,
    ) -> Result<CachedRecord> {
        let slot = self.slot(category, key);
        let _guard = slot.lock().await;

        let now = self.clock.now();
        if let Some(record) = self.store.get_record(category, key)? {
            let verdict = evaluate(category, record.last_refreshed_at, session_state(now), now);
            if verdict == Freshness::Fresh {
                debug!("{}:{} already refreshed by concurrent caller", category, key);
                return Ok(record);
            }
        }

        self.execute(category, key).await
    }

    /// Unconditional refresh (proactive scheduler path). Still serialized
    /// per key, so it cannot duplicate an in-flight on-demand attempt.
    pub async fn refresh(&self, category: DataCategory, key: &str) -> Result<CachedRecord> {
        let slot = self.slot(category, key);
        let _guard = slot.lock().await;
        self.execute(category, key).await
    }

    /// One resolution attempt plus persistence. Caller holds the key lock.
    async fn execute(&self, category: DataCategory, key: &str) -> Result<CachedRecord> {
        let started = Instant::now();

        match self.resolver.resolve(category, key).await {
            Ok(success) => {
                let now = self.clock.now();
                let record =
                    CachedRecord::from_fetch(category, key, success.payload, success.source, now);
                self.store.put_record(&record).await?;
                self.store
                    .append_outcome(&RefreshOutcome::success(
                        category,
                        record.record_count() as i64,
                        started.elapsed().as_millis() as i64,
                        now,
                    ))
                    .await?;
                Ok(record)
            }
            Err(error) => {
                warn!("refresh failed for {}:{}: {}", category, key, error);
                let now = self.clock.now();

                // Serve the last-known-good value annotated with the error;
                // only a key with no successful history becomes absent.
                let record = match self.store.get_record(category, key)? {
                    Some(previous) if previous.payload.is_some() => {
                        previous.with_fetch_error(&error, now)
                    }
                    Some(previous) => {
                        let mut absent = CachedRecord::absent(category, key, &error, now);
                        absent.created_at = previous.created_at;
                        absent
                    }
                    None => CachedRecord::absent(category, key, &error, now),
                };

                self.store.put_record(&record).await?;
                self.store
                    .append_outcome(&RefreshOutcome::failure(
                        category,
                        &error,
                        started.elapsed().as_millis() as i64,
                        now,
                    ))
                    .await?;
                Ok(record)
            }
        }
    }
}
