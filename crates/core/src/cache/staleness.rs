//! Staleness policy: pure mapping of (category, data age, session) to a
//! freshness verdict.
//!
//! `evaluate` has no side effects and is fully determined by its inputs, so
//! it can be tested exhaustively. Thresholds are category-specific; price
//! data tightens while the market is open.

use chrono::{DateTime, Duration, Utc};

use alphastream_market_data::DataCategory;

use crate::calendar::MarketSessionState;

/// Freshness verdict for a cached record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Young enough to serve without any refresh.
    Fresh,
    /// Servable, but a refresh should be triggered.
    Stale,
    /// Nothing was ever fetched for this key.
    Missing,
}

/// Maximum age before a record of this category stops being fresh.
///
/// Open-session thresholds apply during `Open` only; pre-market and
/// after-hours count as off-session (quotes barely move, so the wider
/// threshold avoids burning quota overnight). Categories without a market
/// session (macro series, news, 24/7-traded assets) use one threshold
/// throughout.
pub fn threshold(category: DataCategory, session: MarketSessionState) -> Duration {
    let open = session == MarketSessionState::Open;
    match category {
        DataCategory::EquityQuote => {
            if open {
                Duration::minutes(5)
            } else {
                Duration::hours(1)
            }
        }
        DataCategory::EquityEodBar | DataCategory::EquityIntradayBar => {
            if open {
                Duration::minutes(5)
            } else {
                Duration::hours(24)
            }
        }
        DataCategory::MarketIndex => {
            if open {
                Duration::minutes(10)
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
        DataCategory::MacroIndicator => Duration::minutes(15),
        DataCategory::AlternativeAsset => Duration::minutes(10),
        DataCategory::NewsArticle => Duration::minutes(30),
        DataCategory::EarningsEvent => Duration::hours(1),
    }
}

/// Evaluate the freshness of a record refreshed at `last_refreshed_at`.
///
/// `Missing` when nothing was ever fetched; `Stale` when the age strictly
/// exceeds the category threshold; `Fresh` otherwise.
pub fn evaluate(
    category: DataCategory,
    last_refreshed_at: Option<DateTime<Utc>>,
    session: MarketSessionState,
    now: DateTime<Utc>,
) -> Freshness {
    let Some(refreshed_at) = last_refreshed_at else {
        return Freshness::Missing;
    };

    if now - refreshed_at > threshold(category, session) {
        Freshness::Stale
    } else {
        Freshness::Fresh
    }
}
