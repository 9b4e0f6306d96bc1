//! Financial Modeling Prep market data adapter.
//!
//! Uses the stable endpoint family under `https://financialmodelingprep.com/stable`:
//! - `/quote` for equity and spot quotes
//! - `/historical-price-eod/full` for end-of-day bars
//! - `/historical-chart/5min` for intraday bars
//! - `/sector-performance-snapshot` for the sector snapshot
//! - `/earnings-calendar` for the earnings window
//! - `/news/general-latest` and `/news/stock` for news feeds
//!
//! API documentation: https://site.financialmodelingprep.com/developer/docs

mod models;

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::models::{BarRecord, CategoryPayload, DataCategory, IndexRecord};
use crate::provider::SourceAdapter;
use crate::registry::{AdapterQuota, SlidingWindowLimiter};

use models::{FmpBar, FmpEarningsRow, FmpNewsItem, FmpQuote, FmpSectorRow};

const BASE_URL: &str = "https://financialmodelingprep.com/stable";
const PROVIDER_ID: &str = "FMP";

/// Starter-plan quota.
const REQUESTS_PER_MINUTE: u32 = 300;

/// Earnings window fetched for the `calendar` key: yesterday through +14
/// days, matching the daily calendar job.
const EARNINGS_LOOKBACK_DAYS: u64 = 1;
const EARNINGS_LOOKAHEAD_DAYS: u64 = 14;

/// News page size for feed keys.
const NEWS_FEED_LIMIT: u32 = 100;

/// Index symbols served by this adapter, keyed by our canonical symbol.
const INDEX_SYMBOLS: [(&str, &str, &str); 5] = [
    ("SPX", "^GSPC", "S&P 500"),
    ("NDX", "^IXIC", "Nasdaq Composite"),
    ("DJI", "^DJI", "Dow Jones Industrial Average"),
    ("RUT", "^RUT", "Russell 2000"),
    ("VIX", "^VIX", "CBOE Volatility Index"),
];

const SUPPORTED: [DataCategory; 8] = [
    DataCategory::EquityQuote,
    DataCategory::EquityEodBar,
    DataCategory::EquityIntradayBar,
    DataCategory::MarketIndex,
    DataCategory::SectorPerformance,
    DataCategory::AlternativeAsset,
    DataCategory::NewsArticle,
    DataCategory::EarningsEvent,
];

/// Financial Modeling Prep adapter.
pub struct FmpProvider {
    client: Client,
    api_key: String,
    limiter: SlidingWindowLimiter,
}

impl FmpProvider {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_key,
            limiter: SlidingWindowLimiter::new(AdapterQuota {
                requests_per_minute: REQUESTS_PER_MINUTE,
            }),
        }
    }

    /// FMP uses dashes where tickers carry share-class dots: BRK.B -> BRK-B.
    fn normalize_symbol(symbol: &str) -> String {
        symbol.trim().replace('.', "-")
    }

    fn index_lookup(key: &str) -> Option<(&'static str, &'static str)> {
        INDEX_SYMBOLS
            .iter()
            .find(|(ours, _, _)| *ours == key)
            .map(|(_, fmp, name)| (*fmp, *name))
    }

    /// GET an endpoint and deserialize the JSON body.
    ///
    /// Waits on the adapter quota first; classifies every failure before it
    /// escapes this function.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", BASE_URL, endpoint);
        let mut request = self.client.get(&url).query(&[("apikey", self.api_key.as_str())]);
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("FMP request: {} with {} params", endpoint, params.len());

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                FetchError::Network {
                    provider: PROVIDER_ID.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Network {
                provider: PROVIDER_ID.to_string(),
                message: format!("HTTP {} - {}", status, body),
            });
        }

        let body = response.text().await.map_err(|e| FetchError::Network {
            provider: PROVIDER_ID.to_string(),
            message: format!("failed to read response: {}", e),
        })?;

        serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
            provider: PROVIDER_ID.to_string(),
            message: e.to_string(),
        })
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<FmpQuote, FetchError> {
        let normalized = Self::normalize_symbol(symbol);
        let quotes: Vec<FmpQuote> = self
            .get_json("/quote", &[("symbol", normalized.as_str())])
            .await?;

        quotes.into_iter().next().ok_or_else(|| FetchError::NotFound {
            key: symbol.to_string(),
        })
    }

    async fn fetch_index(&self, key: &str) -> Result<IndexRecord, FetchError> {
        let (fmp_symbol, name) = Self::index_lookup(key).ok_or_else(|| FetchError::NotFound {
            key: key.to_string(),
        })?;

        let quotes: Vec<FmpQuote> = self.get_json("/quote", &[("symbol", fmp_symbol)]).await?;
        let quote = quotes.into_iter().next().ok_or_else(|| FetchError::NotFound {
            key: key.to_string(),
        })?;

        Ok(quote.into_index_record(key, name))
    }

    async fn fetch_eod_bars(&self, symbol: &str) -> Result<CategoryPayload, FetchError> {
        let normalized = Self::normalize_symbol(symbol);
        let rows: Vec<FmpBar> = self
            .get_json("/historical-price-eod/full", &[("symbol", normalized.as_str())])
            .await?;

        if rows.is_empty() {
            return Err(FetchError::NotFound {
                key: symbol.to_string(),
            });
        }
        Ok(CategoryPayload::EodBars(Self::convert_bars(rows)))
    }

    async fn fetch_intraday_bars(&self, symbol: &str) -> Result<CategoryPayload, FetchError> {
        let normalized = Self::normalize_symbol(symbol);
        let rows: Vec<FmpBar> = self
            .get_json("/historical-chart/5min", &[("symbol", normalized.as_str())])
            .await?;

        if rows.is_empty() {
            return Err(FetchError::NotFound {
                key: symbol.to_string(),
            });
        }
        Ok(CategoryPayload::IntradayBars(Self::convert_bars(rows)))
    }

    fn convert_bars(rows: Vec<FmpBar>) -> Vec<BarRecord> {
        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            match row.into_bar_record() {
                Some(bar) => bars.push(bar),
                None => warn!("FMP bar with unparseable date dropped"),
            }
        }
        bars
    }

    async fn fetch_sectors(&self) -> Result<CategoryPayload, FetchError> {
        let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
        let rows: Vec<FmpSectorRow> = self
            .get_json("/sector-performance-snapshot", &[("date", today.as_str())])
            .await?;

        if rows.is_empty() {
            return Err(FetchError::NotFound {
                key: "snapshot".to_string(),
            });
        }
        Ok(CategoryPayload::Sectors(
            rows.into_iter().map(FmpSectorRow::into_sector_record).collect(),
        ))
    }

    async fn fetch_earnings(&self) -> Result<CategoryPayload, FetchError> {
        let today = Utc::now().date_naive();
        let from = today
            .checked_sub_days(Days::new(EARNINGS_LOOKBACK_DAYS))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string();
        let to = today
            .checked_add_days(Days::new(EARNINGS_LOOKAHEAD_DAYS))
            .unwrap_or(today)
            .format("%Y-%m-%d")
            .to_string();

        let rows: Vec<FmpEarningsRow> = self
            .get_json(
                "/earnings-calendar",
                &[("from", from.as_str()), ("to", to.as_str())],
            )
            .await?;

        Ok(CategoryPayload::Earnings(
            rows.into_iter()
                .filter_map(FmpEarningsRow::into_earnings_record)
                .collect(),
        ))
    }

    async fn fetch_news(&self, key: &str) -> Result<CategoryPayload, FetchError> {
        let limit = NEWS_FEED_LIMIT.to_string();
        let items: Vec<FmpNewsItem> = match key {
            "general" => {
                self.get_json(
                    "/news/general-latest",
                    &[("page", "0"), ("limit", limit.as_str())],
                )
                .await?
            }
            "stock-latest" => {
                self.get_json(
                    "/news/stock-latest",
                    &[("page", "0"), ("limit", limit.as_str())],
                )
                .await?
            }
            symbol => {
                self.get_json(
                    "/news/stock",
                    &[("symbols", symbol), ("limit", limit.as_str())],
                )
                .await?
            }
        };

        Ok(CategoryPayload::News(
            items.into_iter().map(FmpNewsItem::into_news_record).collect(),
        ))
    }
}

#[async_trait]
impl SourceAdapter for FmpProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn supported_categories(&self) -> &'static [DataCategory] {
        &SUPPORTED
    }

    fn quota(&self) -> AdapterQuota {
        AdapterQuota {
            requests_per_minute: REQUESTS_PER_MINUTE,
        }
    }

    async fn fetch(
        &self,
        category: DataCategory,
        key: &str,
    ) -> Result<CategoryPayload, FetchError> {
        match category {
            DataCategory::EquityQuote => {
                let quote = self.fetch_quote(key).await?;
                Ok(CategoryPayload::Quote(quote.into_quote_record(key)))
            }
            DataCategory::AlternativeAsset => {
                let quote = self.fetch_quote(key).await?;
                Ok(CategoryPayload::Spot(quote.into_quote_record(key)))
            }
            DataCategory::MarketIndex => Ok(CategoryPayload::Index(self.fetch_index(key).await?)),
            DataCategory::EquityEodBar => self.fetch_eod_bars(key).await,
            DataCategory::EquityIntradayBar => self.fetch_intraday_bars(key).await,
            DataCategory::SectorPerformance => self.fetch_sectors().await,
            DataCategory::EarningsEvent => self.fetch_earnings().await,
            DataCategory::NewsArticle => self.fetch_news(key).await,
            DataCategory::MacroIndicator => Err(FetchError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("category {} not served by this adapter", category),
            }),
        }
    }
}
