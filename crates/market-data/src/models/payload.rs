//! Typed payload records returned by source adapters.
//!
//! Every market value is an `Option<Decimal>`: a field the upstream response
//! did not carry stays `None` all the way into the store and out to callers.
//! No record type has a numeric default and none is ever synthesized.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::category::DataCategory;

/// Real-time quote for an equity or a spot-priced alternative asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
    pub open: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub year_low: Option<Decimal>,
    pub year_high: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    /// Exchange timestamp of the quote, when the provider reports one.
    pub quoted_at: Option<DateTime<Utc>>,
}

/// One OHLCV bar, end-of-day or intraday depending on category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarRecord {
    pub timestamp: DateTime<Utc>,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

/// Market index level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexRecord {
    pub symbol: String,
    pub name: Option<String>,
    pub value: Option<Decimal>,
    pub change: Option<Decimal>,
    pub change_percent: Option<Decimal>,
}

/// Average daily change for one sector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectorRecord {
    pub sector: String,
    pub change_percent: Option<Decimal>,
}

/// Latest observation of a macro economic series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacroRecord {
    pub series_id: String,
    pub name: Option<String>,
    pub value: Option<Decimal>,
    pub change: Option<Decimal>,
    pub unit: Option<String>,
    pub observed_on: Option<NaiveDate>,
}

/// One news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsRecord {
    pub symbol: Option<String>,
    pub title: String,
    pub url: Option<String>,
    pub site: Option<String>,
    pub snippet: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

/// One earnings calendar entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsRecord {
    pub symbol: String,
    pub company: Option<String>,
    pub report_date: Option<NaiveDate>,
    pub eps_estimate: Option<Decimal>,
    pub eps_actual: Option<Decimal>,
    pub revenue_estimate: Option<Decimal>,
    pub revenue_actual: Option<Decimal>,
}

/// Payload wrapper the cache stores as a single JSON column.
///
/// The variant must agree with the record's [`DataCategory`];
/// [`CategoryPayload::matches`] checks the pairing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CategoryPayload {
    Quote(QuoteRecord),
    EodBars(Vec<BarRecord>),
    IntradayBars(Vec<BarRecord>),
    Index(IndexRecord),
    Sectors(Vec<SectorRecord>),
    Macro(MacroRecord),
    Spot(QuoteRecord),
    News(Vec<NewsRecord>),
    Earnings(Vec<EarningsRecord>),
}

impl CategoryPayload {
    /// Whether this payload variant is the right shape for `category`.
    pub fn matches(&self, category: DataCategory) -> bool {
        matches!(
            (self, category),
            (CategoryPayload::Quote(_), DataCategory::EquityQuote)
                | (CategoryPayload::EodBars(_), DataCategory::EquityEodBar)
                | (CategoryPayload::IntradayBars(_), DataCategory::EquityIntradayBar)
                | (CategoryPayload::Index(_), DataCategory::MarketIndex)
                | (CategoryPayload::Sectors(_), DataCategory::SectorPerformance)
                | (CategoryPayload::Macro(_), DataCategory::MacroIndicator)
                | (CategoryPayload::Spot(_), DataCategory::AlternativeAsset)
                | (CategoryPayload::News(_), DataCategory::NewsArticle)
                | (CategoryPayload::Earnings(_), DataCategory::EarningsEvent)
        )
    }

    /// Number of individual records carried by this payload.
    pub fn record_count(&self) -> usize {
        match self {
            CategoryPayload::Quote(_)
            | CategoryPayload::Index(_)
            | CategoryPayload::Macro(_)
            | CategoryPayload::Spot(_) => 1,
            CategoryPayload::EodBars(bars) | CategoryPayload::IntradayBars(bars) => bars.len(),
            CategoryPayload::Sectors(rows) => rows.len(),
            CategoryPayload::News(rows) => rows.len(),
            CategoryPayload::Earnings(rows) => rows.len(),
        }
    }
}
