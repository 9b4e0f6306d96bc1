//! Proactive refresh scheduler.
//!
//! A cadence trigger that keeps the planned universe warm independent of
//! reads. The loop wakes every 30 seconds, fires categories whose next-due
//! time has passed, and reschedules them at a cadence that depends on the
//! market session. A daily retention pass prunes time-series categories.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use tokio::task::JoinHandle;

use alphastream_market_data::DataCategory;

use crate::cache::CacheStore;
use crate::calendar::{session_state, Clock, MarketSessionState};
use crate::constants::{
    EARNINGS_CALENDAR_KEY, INTRADAY_BAR_RETENTION_DAYS, KEY_SPACING_MS, NEWS_RETENTION_DAYS,
    OUTCOME_RETENTION_DAYS, PRUNE_INTERVAL_HOURS, SCHEDULER_TICK_SECS, SECTOR_SNAPSHOT_KEY,
    TRACKED_INDICES, TRACKED_MACRO_INDICATORS, TRACKED_NEWS_FEEDS,
};

use super::orchestrator::RefreshOrchestrator;

/// One category and the natural keys kept warm for it.
#[derive(Debug, Clone)]
pub struct PlanEntry {
    pub category: DataCategory,
    pub keys: Vec<String>,
}

/// Everything the scheduler refreshes proactively.
#[derive(Debug, Clone, Default)]
pub struct RefreshPlan {
    pub entries: Vec<PlanEntry>,
}

impl RefreshPlan {
    /// The standard plan: tracked indices, macro series, news feeds, the
    /// sector snapshot, the earnings calendar, and quotes plus bars for the
    /// configured equity watchlist.
    pub fn standard(watchlist: &[String]) -> Self {
        let keys = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let mut entries = vec![
            PlanEntry {
                category: DataCategory::MarketIndex,
                keys: keys(&TRACKED_INDICES),
            },
            PlanEntry {
                category: DataCategory::MacroIndicator,
                keys: keys(&TRACKED_MACRO_INDICATORS),
            },
            PlanEntry {
                category: DataCategory::NewsArticle,
                keys: keys(&TRACKED_NEWS_FEEDS),
            },
            PlanEntry {
                category: DataCategory::SectorPerformance,
                keys: vec![SECTOR_SNAPSHOT_KEY.to_string()],
            },
            PlanEntry {
                category: DataCategory::EarningsEvent,
                keys: vec![EARNINGS_CALENDAR_KEY.to_string()],
            },
        ];

        if !watchlist.is_empty() {
            entries.push(PlanEntry {
                category: DataCategory::EquityQuote,
                keys: watchlist.to_vec(),
            });
            entries.push(PlanEntry {
                category: DataCategory::EquityEodBar,
                keys: watchlist.to_vec(),
            });
            entries.push(PlanEntry {
                category: DataCategory::EquityIntradayBar,
                keys: watchlist.to_vec(),
            });
        }

        Self { entries }
    }
}

/// Proactive cadence per category. Tighter while the session is open.
pub fn cadence(category: DataCategory, session: MarketSessionState) -> Duration {
    let open = session == MarketSessionState::Open;
    match category {
        DataCategory::EquityQuote
        | DataCategory::MarketIndex
        | DataCategory::MacroIndicator
        | DataCategory::AlternativeAsset => {
            if open {
                Duration::minutes(15)
            } else {
                Duration::hours(1)
            }
        }
        DataCategory::SectorPerformance => {
            if open {
                Duration::minutes(5)
            } else {
                Duration::hours(1)
            }
        }
        DataCategory::NewsArticle => Duration::minutes(10),
        DataCategory::EarningsEvent => Duration::hours(1),
        DataCategory::EquityEodBar | DataCategory::EquityIntradayBar => {
            if open {
                Duration::minutes(15)
            } else {
                Duration::hours(24)
            }
        }
    }
}

/// Background cadence loop.
pub struct RefreshScheduler {
    orchestrator: Arc<RefreshOrchestrator>,
    store: Arc<dyn CacheStore>,
    clock: Arc<dyn Clock>,
    plan: RefreshPlan,
}

impl RefreshScheduler {
    pub fn new(
        orchestrator: Arc<RefreshOrchestrator>,
        store: Arc<dyn CacheStore>,
        clock: Arc<dyn Clock>,
        plan: RefreshPlan,
    ) -> Self {
        Self {
            orchestrator,
            store,
            clock,
            plan,
        }
    }

    /// Spawn the scheduler loop. The initial pass refreshes the whole plan,
    /// so a cold start warms up in the background without blocking startup.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!(
                "refresh scheduler started: {} plan entries",
                self.plan.entries.len()
            );

            // Everything is due immediately on startup.
            let mut next_due: HashMap<DataCategory, DateTime<Utc>> = HashMap::new();
            let mut next_prune = self.clock.now() + Duration::hours(PRUNE_INTERVAL_HOURS);

            loop {
                self.fire_due(&mut next_due).await;

                if self.clock.now() >= next_prune {
                    self.run_retention().await;
                    next_prune = self.clock.now() + Duration::hours(PRUNE_INTERVAL_HOURS);
                }

                tokio::time::sleep(StdDuration::from_secs(SCHEDULER_TICK_SECS)).await;
            }
        })
    }

    /// Refresh every plan entry whose next-due time has passed, then
    /// reschedule it at the session-dependent cadence.
    async fn fire_due(&self, next_due: &mut HashMap<DataCategory, DateTime<Utc>>) {
        let now = self.clock.now();
        let session = session_state(now);

        for entry in &self.plan.entries {
            let due = next_due
                .get(&entry.category)
                .map(|at| now >= *at)
                .unwrap_or(true);
            if !due {
                continue;
            }

            self.refresh_entry(entry).await;
            next_due.insert(entry.category, self.clock.now() + cadence(entry.category, session));
        }
    }

    /// Refresh one entry's keys sequentially, spaced out so proactive work
    /// leaves provider quota headroom for on-demand reads.
    async fn refresh_entry(&self, entry: &PlanEntry) {
        let mut refreshed = 0usize;
        for key in &entry.keys {
            match self.orchestrator.refresh(entry.category, key).await {
                Ok(record) if record.fetch_error.is_none() => refreshed += 1,
                Ok(_) => {}
                Err(error) => {
                    warn!(
                        "scheduled refresh failed for {}:{}: {}",
                        entry.category, key, error
                    );
                }
            }
            tokio::time::sleep(StdDuration::from_millis(KEY_SPACING_MS)).await;
        }
        info!(
            "scheduled refresh: {} {}/{} keys ok",
            entry.category,
            refreshed,
            entry.keys.len()
        );
    }

    /// Retention pass for time-series categories and the outcome log.
    async fn run_retention(&self) {
        let passes = [
            (DataCategory::NewsArticle, Duration::days(NEWS_RETENTION_DAYS)),
            (
                DataCategory::EquityIntradayBar,
                Duration::days(INTRADAY_BAR_RETENTION_DAYS),
            ),
        ];

        for (category, max_age) in passes {
            match self.store.prune(category, max_age).await {
                Ok(count) if count > 0 => info!("pruned {} {} records", count, category),
                Ok(_) => {}
                Err(error) => warn!("prune failed for {}: {}", category, error),
            }
        }

        match self
            .store
            .prune_outcomes(Duration::days(OUTCOME_RETENTION_DAYS))
            .await
        {
            Ok(count) if count > 0 => info!("pruned {} outcome rows", count),
            Ok(_) => {}
            Err(error) => warn!("outcome prune failed: {}", error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cadence_tightens_while_open() {
        assert_eq!(
            cadence(DataCategory::EquityQuote, MarketSessionState::Open),
            Duration::minutes(15)
        );
        assert_eq!(
            cadence(DataCategory::EquityQuote, MarketSessionState::Closed),
            Duration::hours(1)
        );
        assert_eq!(
            cadence(DataCategory::SectorPerformance, MarketSessionState::Open),
            Duration::minutes(5)
        );
    }

    #[test]
    fn test_news_cadence_is_session_independent() {
        for session in [
            MarketSessionState::PreMarket,
            MarketSessionState::Open,
            MarketSessionState::AfterHours,
            MarketSessionState::Closed,
        ] {
            assert_eq!(
                cadence(DataCategory::NewsArticle, session),
                Duration::minutes(10)
            );
        }
    }

    #[test]
    fn test_standard_plan_covers_non_equity_categories() {
        let plan = RefreshPlan::standard(&[]);
        let categories: Vec<DataCategory> =
            plan.entries.iter().map(|e| e.category).collect();
        assert!(categories.contains(&DataCategory::MarketIndex));
        assert!(categories.contains(&DataCategory::MacroIndicator));
        assert!(categories.contains(&DataCategory::NewsArticle));
        assert!(categories.contains(&DataCategory::SectorPerformance));
        assert!(categories.contains(&DataCategory::EarningsEvent));
        // No watchlist, no equity entries.
        assert!(!categories.contains(&DataCategory::EquityQuote));
    }

    #[test]
    fn test_watchlist_adds_equity_entries() {
        let watchlist = vec!["AAPL".to_string(), "MSFT".to_string()];
        let plan = RefreshPlan::standard(&watchlist);
        let quotes = plan
            .entries
            .iter()
            .find(|e| e.category == DataCategory::EquityQuote)
            .expect("quote entry present");
        assert_eq!(quotes.keys, watchlist);
    }
}
