//! SQLite implementation of the cache store.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use alphastream_core::{CacheStore, CachedRecord, RefreshOutcome, Result};
use alphastream_market_data::DataCategory;

use super::model::{CachedRecordDB, RefreshOutcomeDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::IntoCore;
use crate::schema::cached_records::dsl as records_dsl;
use crate::schema::refresh_outcomes::dsl as outcomes_dsl;

/// Cache store backed by SQLite. Reads go through the pool; writes are
/// serialized through the single-writer actor.
pub struct CacheRepository {
    pool: DbPool,
    writer: WriteHandle,
}

impl CacheRepository {
    pub fn new(pool: DbPool, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl CacheStore for CacheRepository {
    fn get_record(&self, category: DataCategory, key: &str) -> Result<Option<CachedRecord>> {
        let mut conn = get_connection(&self.pool)?;

        let row = records_dsl::cached_records
            .filter(records_dsl::category.eq(category.as_str()))
            .filter(records_dsl::record_key.eq(key))
            .first::<CachedRecordDB>(&mut conn)
            .optional()
            .into_core()?;

        row.map(CachedRecordDB::into_domain).transpose()
    }

    async fn put_record(&self, record: &CachedRecord) -> Result<()> {
        let db_row = CachedRecordDB::try_from_domain(record)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                // Whole-record replacement on the (category, record_key)
                // primary key.
                diesel::replace_into(records_dsl::cached_records)
                    .values(&db_row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn append_outcome(&self, outcome: &RefreshOutcome) -> Result<()> {
        let db_row = RefreshOutcomeDB::from(outcome);

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                diesel::insert_into(outcomes_dsl::refresh_outcomes)
                    .values(&db_row)
                    .execute(conn)
                    .into_core()?;
                Ok(())
            })
            .await
    }

    async fn prune(&self, category: DataCategory, max_age: Duration) -> Result<usize> {
        // RFC 3339 with a fixed UTC offset compares lexicographically.
        let cutoff = (Utc::now() - max_age).to_rfc3339();
        let category_str = category.as_str().to_string();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    records_dsl::cached_records
                        .filter(records_dsl::category.eq(category_str))
                        .filter(records_dsl::updated_at.lt(cutoff)),
                )
                .execute(conn)
                .into_core()
            })
            .await
    }

    async fn prune_outcomes(&self, max_age: Duration) -> Result<usize> {
        let cutoff = (Utc::now() - max_age).to_rfc3339();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                diesel::delete(
                    outcomes_dsl::refresh_outcomes.filter(outcomes_dsl::created_at.lt(cutoff)),
                )
                .execute(conn)
                .into_core()
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use alphastream_market_data::{CategoryPayload, FetchError, QuoteRecord};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    fn open_repository(dir: &TempDir) -> CacheRepository {
        let db_path = dir.path().join("cache-test.db");
        let pool = create_pool(db_path.to_str().unwrap()).unwrap();
        run_migrations(&pool).unwrap();
        let writer = spawn_writer(pool.clone());
        CacheRepository::new(pool, writer)
    }

    fn quote_record(key: &str, price: Decimal) -> CachedRecord {
        CachedRecord::from_fetch(
            DataCategory::EquityQuote,
            key,
            CategoryPayload::Quote(QuoteRecord {
                symbol: key.to_string(),
                name: None,
                price: Some(price),
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
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        let record = quote_record("AAPL", dec!(198.42));
        repo.put_record(&record).await.unwrap();

        let loaded = repo
            .get_record(DataCategory::EquityQuote, "AAPL")
            .unwrap()
            .unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        assert!(repo
            .get_record(DataCategory::EquityQuote, "MISSING")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_put_replaces_whole_record() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        repo.put_record(&quote_record("AAPL", dec!(100))).await.unwrap();
        repo.put_record(&quote_record("AAPL", dec!(101))).await.unwrap();

        let loaded = repo
            .get_record(DataCategory::EquityQuote, "AAPL")
            .unwrap()
            .unwrap();
        match loaded.payload.unwrap() {
            CategoryPayload::Quote(quote) => assert_eq!(quote.price, Some(dec!(101))),
            other => panic!("unexpected payload: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_same_key_different_category_is_distinct() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        repo.put_record(&quote_record("AAPL", dec!(100))).await.unwrap();
        let absent = CachedRecord::absent(
            DataCategory::NewsArticle,
            "AAPL",
            &FetchError::AllSourcesFailed,
            Utc::now(),
        );
        repo.put_record(&absent).await.unwrap();

        let quote = repo
            .get_record(DataCategory::EquityQuote, "AAPL")
            .unwrap()
            .unwrap();
        assert!(quote.payload.is_some());

        let news = repo
            .get_record(DataCategory::NewsArticle, "AAPL")
            .unwrap()
            .unwrap();
        assert!(news.payload.is_none());
    }

    #[tokio::test]
    async fn test_prune_by_age_and_category() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        let mut old_news = CachedRecord::absent(
            DataCategory::NewsArticle,
            "general",
            &FetchError::AllSourcesFailed,
            Utc::now() - Duration::days(10),
        );
        old_news.updated_at = Utc::now() - Duration::days(10);
        repo.put_record(&old_news).await.unwrap();
        repo.put_record(&quote_record("AAPL", dec!(100))).await.unwrap();

        let pruned = repo
            .prune(DataCategory::NewsArticle, Duration::days(7))
            .await
            .unwrap();
        assert_eq!(pruned, 1);

        // Other categories are untouched.
        assert!(repo
            .get_record(DataCategory::EquityQuote, "AAPL")
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_outcome_append_and_prune() {
        let dir = TempDir::new().unwrap();
        let repo = open_repository(&dir);

        let mut old = RefreshOutcome::success(DataCategory::EquityQuote, 1, 50, Utc::now());
        old.created_at = Utc::now() - Duration::days(40);
        repo.append_outcome(&old).await.unwrap();
        repo.append_outcome(&RefreshOutcome::success(
            DataCategory::EquityQuote,
            1,
            50,
            Utc::now(),
        ))
        .await
        .unwrap();

        let pruned = repo.prune_outcomes(Duration::days(30)).await.unwrap();
        assert_eq!(pruned, 1);
    }
}
