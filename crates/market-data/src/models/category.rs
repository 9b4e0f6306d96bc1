//! Data category definitions.
//!
//! Every cached datum belongs to exactly one [`DataCategory`]. The category
//! drives which source adapters are consulted, how records are keyed in the
//! store, and (in the core crate) the staleness thresholds and refresh
//! cadence applied to it.

use serde::{Deserialize, Serialize};

/// Category identifiers as stored in the database and used in routing tables.
pub const CATEGORY_EQUITY_QUOTE: &str = "equity-quote";
pub const CATEGORY_EQUITY_EOD_BAR: &str = "equity-eod-bar";
pub const CATEGORY_EQUITY_INTRADAY_BAR: &str = "equity-intraday-bar";
pub const CATEGORY_MARKET_INDEX: &str = "market-index";
pub const CATEGORY_SECTOR_PERFORMANCE: &str = "sector-performance";
pub const CATEGORY_MACRO_INDICATOR: &str = "macro-indicator";
pub const CATEGORY_ALTERNATIVE_ASSET: &str = "alternative-asset";
pub const CATEGORY_NEWS_ARTICLE: &str = "news-article";
pub const CATEGORY_EARNINGS_EVENT: &str = "earnings-event";

/// Classification of a cached market datum.
///
/// Records are keyed by `(category, natural key)`. The natural key is a
/// ticker for equity categories, an index symbol for `MarketIndex`, a FRED
/// series id for `MacroIndicator`, and a feed name (e.g. `"general"`) for
/// `NewsArticle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataCategory {
    /// Real-time equity quote (price, change, day range, volume).
    EquityQuote,
    /// End-of-day OHLCV bars.
    EquityEodBar,
    /// Intraday (5-minute) OHLCV bars.
    EquityIntradayBar,
    /// Major market index level (SPX, NDX, DJI, RUT, VIX).
    MarketIndex,
    /// Sector performance snapshot.
    SectorPerformance,
    /// Macro economic series point (FRED).
    MacroIndicator,
    /// Crypto / commodity spot price.
    AlternativeAsset,
    /// News feed.
    NewsArticle,
    /// Earnings calendar window.
    EarningsEvent,
}

impl DataCategory {
    /// All categories, in a stable order. Used by routing tables and the
    /// refresh scheduler.
    pub const ALL: [DataCategory; 9] = [
        DataCategory::EquityQuote,
        DataCategory::EquityEodBar,
        DataCategory::EquityIntradayBar,
        DataCategory::MarketIndex,
        DataCategory::SectorPerformance,
        DataCategory::MacroIndicator,
        DataCategory::AlternativeAsset,
        DataCategory::NewsArticle,
        DataCategory::EarningsEvent,
    ];

    /// Stable string identifier, used as the storage key prefix.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataCategory::EquityQuote => CATEGORY_EQUITY_QUOTE,
            DataCategory::EquityEodBar => CATEGORY_EQUITY_EOD_BAR,
            DataCategory::EquityIntradayBar => CATEGORY_EQUITY_INTRADAY_BAR,
            DataCategory::MarketIndex => CATEGORY_MARKET_INDEX,
            DataCategory::SectorPerformance => CATEGORY_SECTOR_PERFORMANCE,
            DataCategory::MacroIndicator => CATEGORY_MACRO_INDICATOR,
            DataCategory::AlternativeAsset => CATEGORY_ALTERNATIVE_ASSET,
            DataCategory::NewsArticle => CATEGORY_NEWS_ARTICLE,
            DataCategory::EarningsEvent => CATEGORY_EARNINGS_EVENT,
        }
    }

    /// Parse a storage identifier back into a category.
    pub fn parse(s: &str) -> Option<DataCategory> {
        match s {
            CATEGORY_EQUITY_QUOTE => Some(DataCategory::EquityQuote),
            CATEGORY_EQUITY_EOD_BAR => Some(DataCategory::EquityEodBar),
            CATEGORY_EQUITY_INTRADAY_BAR => Some(DataCategory::EquityIntradayBar),
            CATEGORY_MARKET_INDEX => Some(DataCategory::MarketIndex),
            CATEGORY_SECTOR_PERFORMANCE => Some(DataCategory::SectorPerformance),
            CATEGORY_MACRO_INDICATOR => Some(DataCategory::MacroIndicator),
            CATEGORY_ALTERNATIVE_ASSET => Some(DataCategory::AlternativeAsset),
            CATEGORY_NEWS_ARTICLE => Some(DataCategory::NewsArticle),
            CATEGORY_EARNINGS_EVENT => Some(DataCategory::EarningsEvent),
            _ => None,
        }
    }
}

impl std::fmt::Display for DataCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_string_round_trip() {
        for category in DataCategory::ALL {
            assert_eq!(DataCategory::parse(category.as_str()), Some(category));
        }
    }

    #[test]
    fn test_unknown_identifier_rejected() {
        assert_eq!(DataCategory::parse("equity"), None);
        assert_eq!(DataCategory::parse(""), None);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(DataCategory::EquityQuote.to_string(), "equity-quote");
        assert_eq!(DataCategory::MacroIndicator.to_string(), "macro-indicator");
    }
}
