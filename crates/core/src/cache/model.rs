//! Cached record and refresh outcome domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use alphastream_market_data::{CategoryPayload, DataCategory, FetchError};

/// One cached datum, keyed by `(category, key)`.
///
/// A record is replaced whole on every refresh, never partially merged.
/// `last_refreshed_at` moves only on an actually-successful source fetch, so
/// staleness always reflects true data age; serving last-known-good after a
/// failed refresh does not touch it.
///
/// `is_synthetic` is `false` for every record this engine produces: absent
/// data is represented as `payload: None`, never as a placeholder value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedRecord {
    pub category: DataCategory,
    pub key: String,
    /// `None` means explicit absence (nothing ever fetched, or definitive
    /// upstream absence).
    pub payload: Option<CategoryPayload>,
    pub last_refreshed_at: Option<DateTime<Utc>>,
    /// Adapter id that produced the current payload.
    pub source_used: Option<String>,
    /// Classified error from the most recent failed refresh, when the
    /// record is being served degraded.
    pub fetch_error: Option<String>,
    pub is_synthetic: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CachedRecord {
    /// Record for a successful fetch.
    pub fn from_fetch(
        category: DataCategory,
        key: &str,
        payload: CategoryPayload,
        source: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            key: key.to_string(),
            payload: Some(payload),
            last_refreshed_at: Some(now),
            source_used: Some(source),
            fetch_error: None,
            is_synthetic: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record for a key with no data at all: every source failed and there
    /// is no last-known-good, or absence is definitive.
    pub fn absent(
        category: DataCategory,
        key: &str,
        error: &FetchError,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            category,
            key: key.to_string(),
            payload: None,
            last_refreshed_at: None,
            source_used: None,
            fetch_error: Some(error.to_string()),
            is_synthetic: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Annotate this record with a failed-refresh error, preserving the
    /// payload and `last_refreshed_at`.
    pub fn with_fetch_error(mut self, error: &FetchError, now: DateTime<Utc>) -> Self {
        self.fetch_error = Some(error.to_string());
        self.updated_at = now;
        self
    }

    /// Number of individual records in the payload, 0 when absent.
    pub fn record_count(&self) -> usize {
        self.payload.as_ref().map(CategoryPayload::record_count).unwrap_or(0)
    }
}

/// Append-only log entry for one refresh attempt.
///
/// Written for operational visibility; never read on the hot path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshOutcome {
    pub id: String,
    pub category: DataCategory,
    pub records_affected: i64,
    pub success: bool,
    pub duration_ms: i64,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RefreshOutcome {
    pub fn success(
        category: DataCategory,
        records_affected: i64,
        duration_ms: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            records_affected,
            success: true,
            duration_ms,
            error: None,
            created_at: now,
        }
    }

    pub fn failure(
        category: DataCategory,
        error: &FetchError,
        duration_ms: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            category,
            records_affected: 0,
            success: false,
            duration_ms,
            error: Some(error.to_string()),
            created_at: now,
        }
    }
}
