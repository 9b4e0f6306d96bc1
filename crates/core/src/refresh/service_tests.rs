//! End-to-end tests for the refresh engine against in-memory fakes:
//! read-through semantics, in-flight deduplication, and degradation when
//! every source fails.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use alphastream_market_data::{
    CategoryPayload, DataCategory, FetchError, FetchSuccess, QuoteRecord,
};

use crate::cache::{CacheAccessor, CacheStore, CachedRecord, RefreshOutcome};
use crate::calendar::Clock;
use crate::errors::Result;
use crate::refresh::{RefreshOrchestrator, SourceResolver};

// =============================================================================
// Fakes
// =============================================================================

/// Controllable clock. The base instant is a Wednesday 15:00 UTC, i.e. an
/// open session.
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn open_session() -> Arc<Self> {
        Arc::new(Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2026, 8, 5, 15, 0, 0).unwrap()),
        })
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// In-memory store keyed by (category, key).
#[derive(Default)]
struct MemoryStore {
    records: Mutex<HashMap<(DataCategory, String), CachedRecord>>,
    outcomes: Mutex<Vec<RefreshOutcome>>,
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn get_record(&self, category: DataCategory, key: &str) -> Result<Option<CachedRecord>> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .get(&(category, key.to_string()))
            .cloned())
    }

    async fn put_record(&self, record: &CachedRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert((record.category, record.key.clone()), record.clone());
        Ok(())
    }

    async fn append_outcome(&self, outcome: &RefreshOutcome) -> Result<()> {
        self.outcomes.lock().unwrap().push(outcome.clone());
        Ok(())
    }

    async fn prune(&self, category: DataCategory, max_age: Duration) -> Result<usize> {
        let mut records = self.records.lock().unwrap();
        let cutoff = Utc::now() - max_age;
        let before = records.len();
        records.retain(|(cat, _), record| *cat != category || record.updated_at >= cutoff);
        Ok(before - records.len())
    }

    async fn prune_outcomes(&self, max_age: Duration) -> Result<usize> {
        let mut outcomes = self.outcomes.lock().unwrap();
        let cutoff = Utc::now() - max_age;
        let before = outcomes.len();
        outcomes.retain(|o| o.created_at >= cutoff);
        Ok(before - outcomes.len())
    }
}

/// Resolver that plays back a script of results, counting calls.
struct ScriptedResolver {
    script: Mutex<VecDeque<std::result::Result<FetchSuccess, FetchError>>>,
    calls: AtomicUsize,
    delay: StdDuration,
}

impl ScriptedResolver {
    fn new(
        script: Vec<std::result::Result<FetchSuccess, FetchError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            delay: StdDuration::ZERO,
        })
    }

    fn with_delay(
        script: Vec<std::result::Result<FetchSuccess, FetchError>>,
        delay: StdDuration,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceResolver for ScriptedResolver {
    async fn resolve(
        &self,
        _category: DataCategory,
        _key: &str,
    ) -> std::result::Result<FetchSuccess, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::AllSourcesFailed))
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn quote_payload(price: Decimal) -> CategoryPayload {
    CategoryPayload::Quote(QuoteRecord {
        symbol: "ZZZ".to_string(),
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
    })
}

fn success_from(source: &str, price: Decimal) -> std::result::Result<FetchSuccess, FetchError> {
    Ok(FetchSuccess {
        payload: quote_payload(price),
        source: source.to_string(),
    })
}

fn price_of(record: &CachedRecord) -> Option<Decimal> {
    match record.payload.as_ref()? {
        CategoryPayload::Quote(quote) => quote.price,
        _ => None,
    }
}

struct Engine {
    store: Arc<MemoryStore>,
    resolver: Arc<ScriptedResolver>,
    clock: Arc<ManualClock>,
    orchestrator: Arc<RefreshOrchestrator>,
    accessor: CacheAccessor,
}

fn engine(resolver: Arc<ScriptedResolver>) -> Engine {
    let store = Arc::new(MemoryStore::default());
    let clock = ManualClock::open_session();
    let orchestrator = Arc::new(RefreshOrchestrator::new(
        store.clone(),
        resolver.clone(),
        clock.clone(),
    ));
    let accessor = CacheAccessor::new(store.clone(), orchestrator.clone(), clock.clone());
    Engine {
        store,
        resolver,
        clock,
        orchestrator,
        accessor,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn test_missing_key_blocks_on_fetch_and_persists() {
    let engine = engine(ScriptedResolver::new(vec![success_from("FMP", dec!(100))]));

    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();

    assert_eq!(price_of(&record), Some(dec!(100)));
    assert_eq!(record.source_used.as_deref(), Some("FMP"));
    assert_eq!(engine.resolver.calls(), 1);

    let outcomes = engine.store.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].success);
    assert_eq!(outcomes[0].records_affected, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_missing_reads_trigger_single_fetch() {
    let engine = engine(ScriptedResolver::with_delay(
        vec![success_from("FMP", dec!(100))],
        StdDuration::from_millis(50),
    ));
    let accessor = Arc::new(engine.accessor);

    let mut handles = Vec::new();
    for _ in 0..5 {
        let accessor = accessor.clone();
        handles.push(tokio::spawn(async move {
            accessor.get(DataCategory::EquityQuote, "ZZZ").await
        }));
    }

    for handle in handles {
        let record = handle.await.unwrap().unwrap();
        assert_eq!(price_of(&record), Some(dec!(100)));
    }

    // Five concurrent readers, exactly one upstream fetch.
    assert_eq!(engine.resolver.calls(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_stale_while_revalidate_scenario() {
    // ZZZ with a 5-minute open-session threshold: fetched at t=0 with
    // price 100, fresh at t=4min, served stale at t=6min while refreshing
    // to 101, new value visible at t=7min.
    let engine = engine(ScriptedResolver::new(vec![
        success_from("FMP", dec!(100)),
        success_from("FMP", dec!(101)),
    ]));

    // t=0: missing, blocking fetch.
    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert_eq!(price_of(&record), Some(dec!(100)));

    // t=4min: fresh, no upstream call.
    engine.clock.advance(Duration::minutes(4));
    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert_eq!(price_of(&record), Some(dec!(100)));
    assert_eq!(engine.resolver.calls(), 1);

    // t=6min: stale; old value served immediately, refresh runs behind.
    engine.clock.advance(Duration::minutes(2));
    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert_eq!(price_of(&record), Some(dec!(100)));

    // Give the background revalidation time to land.
    tokio::time::sleep(StdDuration::from_millis(100)).await;
    assert_eq!(engine.resolver.calls(), 2);

    // t=7min: the refreshed value is served.
    engine.clock.advance(Duration::minutes(1));
    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert_eq!(price_of(&record), Some(dec!(101)));
    assert_eq!(engine.resolver.calls(), 2);
}

#[tokio::test]
async fn test_all_sources_failed_serves_last_known_good() {
    let engine = engine(ScriptedResolver::new(vec![
        success_from("FMP", dec!(100)),
        Err(FetchError::Network {
            provider: "FMP".to_string(),
            message: "connection reset".to_string(),
        }),
    ]));

    let fetched = engine
        .orchestrator
        .refresh(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    let first_refreshed_at = fetched.last_refreshed_at;

    engine.clock.advance(Duration::minutes(10));
    let degraded = engine
        .orchestrator
        .refresh(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();

    // Old payload served, error annotated, no fabricated substitute, and
    // the data age still reflects the last real fetch.
    assert_eq!(price_of(&degraded), Some(dec!(100)));
    assert!(degraded.fetch_error.is_some());
    assert!(!degraded.is_synthetic);
    assert_eq!(degraded.last_refreshed_at, first_refreshed_at);

    let outcomes = engine.store.outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[0].success);
    assert!(!outcomes[1].success);
}

#[tokio::test]
async fn test_total_failure_with_no_history_yields_absent_record() {
    let engine = engine(ScriptedResolver::new(vec![Err(FetchError::Network {
        provider: "FMP".to_string(),
        message: "dns failure".to_string(),
    })]));

    // No exception surfaces; the caller gets an explicit absent record.
    let record = engine
        .accessor
        .get(DataCategory::MarketIndex, "SPX")
        .await
        .unwrap();

    assert_eq!(record.payload, None);
    assert!(record.fetch_error.is_some());
    assert_eq!(record.last_refreshed_at, None);
    assert!(!record.is_synthetic);
}

#[tokio::test]
async fn test_not_found_recorded_as_definitive_absence() {
    let engine = engine(ScriptedResolver::new(vec![Err(FetchError::NotFound {
        key: "ZZZ".to_string(),
    })]));

    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();

    assert_eq!(record.payload, None);
    assert_eq!(record.fetch_error.as_deref(), Some("Not found: ZZZ"));
}

#[tokio::test]
async fn test_fresh_read_never_calls_upstream() {
    let engine = engine(ScriptedResolver::new(vec![success_from(
        "FINNHUB",
        dec!(512),
    )]));

    engine
        .accessor
        .get(DataCategory::EquityQuote, "SPY")
        .await
        .unwrap();
    assert_eq!(engine.resolver.calls(), 1);

    // Well inside the 5-minute open threshold.
    engine.clock.advance(Duration::minutes(2));
    let record = engine
        .accessor
        .get(DataCategory::EquityQuote, "SPY")
        .await
        .unwrap();

    assert_eq!(engine.resolver.calls(), 1);
    assert_eq!(record.source_used.as_deref(), Some("FINNHUB"));
}

#[tokio::test]
async fn test_successful_refresh_clears_previous_error_annotation() {
    let engine = engine(ScriptedResolver::new(vec![
        success_from("FMP", dec!(100)),
        Err(FetchError::AllSourcesFailed),
        success_from("FMP", dec!(102)),
    ]));

    engine
        .orchestrator
        .refresh(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    let degraded = engine
        .orchestrator
        .refresh(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert!(degraded.fetch_error.is_some());

    let recovered = engine
        .orchestrator
        .refresh(DataCategory::EquityQuote, "ZZZ")
        .await
        .unwrap();
    assert_eq!(price_of(&recovered), Some(dec!(102)));
    assert_eq!(recovered.fetch_error, None);
}
