//! Database row types for cached records and refresh outcomes.
//!
//! Timestamps are stored as RFC 3339 text, payloads as JSON text. Rows
//! convert to and from the core domain models; a row whose stored category
//! or payload no longer parses surfaces as a serialization error rather
//! than a silently defaulted record.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use alphastream_core::{CachedRecord, Error, RefreshOutcome, Result};
use alphastream_market_data::{CategoryPayload, DataCategory};

use crate::schema::{cached_records, refresh_outcomes};

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = cached_records)]
pub struct CachedRecordDB {
    pub category: String,
    pub record_key: String,
    pub payload: Option<String>,
    pub last_refreshed_at: Option<String>,
    pub source_used: Option<String>,
    pub fetch_error: Option<String>,
    pub is_synthetic: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl CachedRecordDB {
    pub fn try_from_domain(record: &CachedRecord) -> Result<Self> {
        let payload = record
            .payload
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(Self {
            category: record.category.to_string(),
            record_key: record.key.clone(),
            payload,
            last_refreshed_at: record.last_refreshed_at.map(|t| t.to_rfc3339()),
            source_used: record.source_used.clone(),
            fetch_error: record.fetch_error.clone(),
            is_synthetic: record.is_synthetic,
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        })
    }

    pub fn into_domain(self) -> Result<CachedRecord> {
        let category = DataCategory::parse(&self.category).ok_or_else(|| {
            Error::Serialization(format!("unknown category in store: {}", self.category))
        })?;

        let payload: Option<CategoryPayload> = self
            .payload
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        Ok(CachedRecord {
            category,
            key: self.record_key,
            payload,
            last_refreshed_at: self
                .last_refreshed_at
                .as_deref()
                .map(parse_timestamp)
                .transpose()?,
            source_used: self.source_used,
            fetch_error: self.fetch_error,
            is_synthetic: self.is_synthetic,
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Insertable)]
#[diesel(table_name = refresh_outcomes)]
pub struct RefreshOutcomeDB {
    pub id: String,
    pub category: String,
    pub records_affected: i64,
    pub success: bool,
    pub duration_ms: i64,
    pub error: Option<String>,
    pub created_at: String,
}

impl From<&RefreshOutcome> for RefreshOutcomeDB {
    fn from(outcome: &RefreshOutcome) -> Self {
        Self {
            id: outcome.id.clone(),
            category: outcome.category.to_string(),
            records_affected: outcome.records_affected,
            success: outcome.success,
            duration_ms: outcome.duration_ms,
            error: outcome.error.clone(),
            created_at: outcome.created_at.to_rfc3339(),
        }
    }
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Serialization(format!("bad timestamp '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alphastream_market_data::{FetchError, QuoteRecord};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 5, 15, 0, 0).unwrap()
    }

    #[test]
    fn test_record_round_trip() {
        let record = CachedRecord::from_fetch(
            DataCategory::EquityQuote,
            "AAPL",
            CategoryPayload::Quote(QuoteRecord {
                symbol: "AAPL".to_string(),
                name: None,
                price: Some(dec!(198.42)),
                change: None,
                change_percent: None,
                open: None,
                previous_close: None,
                day_low: None,
                day_high: None,
                year_low: None,
                year_high: None,
                volume: None,
                market_cap: None,
                quoted_at: None,
            }),
            "FMP".to_string(),
            now(),
        );

        let row = CachedRecordDB::try_from_domain(&record).unwrap();
        assert_eq!(row.category, "equity-quote");
        assert!(!row.is_synthetic);

        let back = row.into_domain().unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_absent_record_round_trip_keeps_null_payload() {
        let record = CachedRecord::absent(
            DataCategory::MarketIndex,
            "SPX",
            &FetchError::AllSourcesFailed,
            now(),
        );
        let row = CachedRecordDB::try_from_domain(&record).unwrap();
        assert_eq!(row.payload, None);
        assert_eq!(row.last_refreshed_at, None);

        let back = row.into_domain().unwrap();
        assert_eq!(back.payload, None);
        assert_eq!(back.fetch_error, record.fetch_error);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let row = CachedRecordDB {
            category: "weather-report".to_string(),
            record_key: "x".to_string(),
            payload: None,
            last_refreshed_at: None,
            source_used: None,
            fetch_error: None,
            is_synthetic: false,
            created_at: now().to_rfc3339(),
            updated_at: now().to_rfc3339(),
        };
        assert!(row.into_domain().is_err());
    }
}
