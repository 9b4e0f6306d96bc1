//! FMP API response structures and conversions into domain records.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::{BarRecord, EarningsRecord, IndexRecord, NewsRecord, QuoteRecord, SectorRecord};

/// Row from `/quote`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpQuote {
    pub symbol: Option<String>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub change: Option<Decimal>,
    #[serde(rename = "changePercentage")]
    pub change_percentage: Option<Decimal>,
    pub open: Option<Decimal>,
    pub previous_close: Option<Decimal>,
    pub day_low: Option<Decimal>,
    pub day_high: Option<Decimal>,
    pub year_low: Option<Decimal>,
    pub year_high: Option<Decimal>,
    pub volume: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    /// Unix seconds.
    pub timestamp: Option<i64>,
}

impl FmpQuote {
    /// Convert into a quote record keyed by the caller's symbol (the FMP
    /// symbol may be dash-normalized). Missing fields stay `None`.
    pub fn into_quote_record(self, requested_symbol: &str) -> QuoteRecord {
        QuoteRecord {
            symbol: requested_symbol.to_string(),
            name: self.name,
            price: self.price,
            change: self.change,
            change_percent: self.change_percentage,
            open: self.open,
            previous_close: self.previous_close,
            day_low: self.day_low,
            day_high: self.day_high,
            year_low: self.year_low,
            year_high: self.year_high,
            volume: self.volume,
            market_cap: self.market_cap,
            quoted_at: self
                .timestamp
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    pub fn into_index_record(self, symbol: &str, name: &str) -> IndexRecord {
        IndexRecord {
            symbol: symbol.to_string(),
            name: Some(name.to_string()),
            value: self.price,
            change: self.change,
            change_percent: self.change_percentage,
        }
    }
}

/// Row from `/historical-price-eod/full` and `/historical-chart/5min`.
/// EOD rows carry a bare date, intraday rows a date-time.
#[derive(Debug, Deserialize)]
pub struct FmpBar {
    pub date: String,
    pub open: Option<Decimal>,
    pub high: Option<Decimal>,
    pub low: Option<Decimal>,
    pub close: Option<Decimal>,
    pub volume: Option<Decimal>,
}

impl FmpBar {
    /// Returns `None` when the date field doesn't parse; the caller drops
    /// and logs the row.
    pub fn into_bar_record(self) -> Option<BarRecord> {
        let timestamp = parse_fmp_datetime(&self.date)?;
        Some(BarRecord {
            timestamp,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self.volume,
        })
    }
}

/// Row from `/sector-performance-snapshot`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpSectorRow {
    pub sector: String,
    pub average_change: Option<Decimal>,
}

impl FmpSectorRow {
    pub fn into_sector_record(self) -> SectorRecord {
        SectorRecord {
            sector: self.sector,
            change_percent: self.average_change,
        }
    }
}

/// Row from `/earnings-calendar`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpEarningsRow {
    pub symbol: Option<String>,
    /// Company name; the endpoint has used both field names over time.
    pub company: Option<String>,
    pub name: Option<String>,
    pub date: Option<String>,
    pub eps_estimated: Option<Decimal>,
    pub eps_actual: Option<Decimal>,
    pub revenue_estimated: Option<Decimal>,
    pub revenue_actual: Option<Decimal>,
}

impl FmpEarningsRow {
    /// Rows without a symbol are dropped.
    pub fn into_earnings_record(self) -> Option<EarningsRecord> {
        let symbol = self.symbol?;
        Some(EarningsRecord {
            symbol,
            company: self.company.or(self.name),
            report_date: self
                .date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()),
            eps_estimate: self.eps_estimated,
            eps_actual: self.eps_actual,
            revenue_estimate: self.revenue_estimated,
            revenue_actual: self.revenue_actual,
        })
    }
}

/// Item from the `/news/*` feeds.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FmpNewsItem {
    pub symbol: Option<String>,
    #[serde(default)]
    pub title: String,
    pub url: Option<String>,
    pub site: Option<String>,
    pub text: Option<String>,
    pub published_date: Option<String>,
}

impl FmpNewsItem {
    pub fn into_news_record(self) -> NewsRecord {
        NewsRecord {
            symbol: self.symbol,
            title: self.title,
            url: self.url,
            site: self.site,
            snippet: self.text,
            published_at: self.published_date.as_deref().and_then(parse_fmp_datetime),
        }
    }
}

/// FMP timestamps come as either `YYYY-MM-DD HH:MM:SS` or a bare date.
fn parse_fmp_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| Utc.from_utc_datetime(&dt))
}
