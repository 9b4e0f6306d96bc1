//! Finnhub market data adapter.
//!
//! Secondary source for quotes and indices, primary-quality news feed:
//! - `/quote` for equities, indices and crypto spot
//! - `/news` for the general market feed
//!
//! The free tier allows 60 API calls per minute.
//! API documentation: https://finnhub.io/docs/api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{
    CategoryPayload, DataCategory, IndexRecord, NewsRecord, QuoteRecord,
};
use crate::provider::SourceAdapter;
use crate::registry::{AdapterQuota, SlidingWindowLimiter};

const BASE_URL: &str = "https://finnhub.io/api/v1";
const PROVIDER_ID: &str = "FINNHUB";

/// Free-tier quota.
const REQUESTS_PER_MINUTE: u32 = 60;

/// Finnhub symbols for the indices we track.
const INDEX_SYMBOLS: [(&str, &str, &str); 5] = [
    ("SPX", "^GSPC", "S&P 500"),
    ("NDX", "^IXIC", "Nasdaq Composite"),
    ("DJI", "^DJI", "Dow Jones Industrial Average"),
    ("RUT", "^RUT", "Russell 2000"),
    ("VIX", "^VIX", "CBOE Volatility Index"),
];

const SUPPORTED: [DataCategory; 4] = [
    DataCategory::EquityQuote,
    DataCategory::MarketIndex,
    DataCategory::AlternativeAsset,
    DataCategory::NewsArticle,
];

// ============================================================================
// API response structures
// ============================================================================

/// Response from `/quote`. Finnhub returns all-zero bodies for unknown
/// symbols instead of an error, so `t == 0` is treated as absence.
#[derive(Debug, Deserialize)]
struct QuoteResponse {
    /// Current price.
    c: Option<Decimal>,
    /// Change.
    d: Option<Decimal>,
    /// Percent change.
    dp: Option<Decimal>,
    /// High of the day.
    h: Option<Decimal>,
    /// Low of the day.
    l: Option<Decimal>,
    /// Open of the day.
    o: Option<Decimal>,
    /// Previous close.
    pc: Option<Decimal>,
    /// Unix timestamp.
    t: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct NewsItem {
    related: Option<String>,
    #[serde(default)]
    headline: String,
    url: Option<String>,
    source: Option<String>,
    summary: Option<String>,
    /// Unix seconds.
    datetime: Option<i64>,
}

// ============================================================================
// FinnhubProvider
// ============================================================================

/// Finnhub adapter.
pub struct FinnhubProvider {
    client: Client,
    api_key: String,
    limiter: SlidingWindowLimiter,
}

impl FinnhubProvider {
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

    fn index_lookup(key: &str) -> Option<(&'static str, &'static str)> {
        INDEX_SYMBOLS
            .iter()
            .find(|(ours, _, _)| *ours == key)
            .map(|(_, finnhub, name)| (*finnhub, *name))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", BASE_URL, endpoint);
        let mut request = self
            .client
            .get(&url)
            .header("X-Finnhub-Token", &self.api_key);
        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("Finnhub request: {}", endpoint);

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
        // 403 is how Finnhub signals an exhausted free-tier quota.
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS
            || status == reqwest::StatusCode::FORBIDDEN
        {
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

    async fn fetch_quote_raw(&self, symbol: &str, key: &str) -> Result<QuoteResponse, FetchError> {
        let quote: QuoteResponse = self.get_json("/quote", &[("symbol", symbol)]).await?;

        // An all-empty body means the symbol is unknown to Finnhub.
        if quote.t.unwrap_or(0) == 0 && quote.c.is_none() {
            return Err(FetchError::NotFound {
                key: key.to_string(),
            });
        }
        Ok(quote)
    }

    fn to_quote_record(quote: QuoteResponse, symbol: &str) -> QuoteRecord {
        QuoteRecord {
            symbol: symbol.to_string(),
            name: None,
            price: quote.c,
            change: quote.d,
            change_percent: quote.dp,
            open: quote.o,
            previous_close: quote.pc,
            day_low: quote.l,
            day_high: quote.h,
            year_low: None,
            year_high: None,
            volume: None,
            market_cap: None,
            quoted_at: quote
                .t
                .filter(|secs| *secs > 0)
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        }
    }

    async fn fetch_news(&self) -> Result<CategoryPayload, FetchError> {
        let items: Vec<NewsItem> = self.get_json("/news", &[("category", "general")]).await?;

        Ok(CategoryPayload::News(
            items
                .into_iter()
                .map(|item| NewsRecord {
                    symbol: item.related.filter(|s| !s.is_empty()),
                    title: item.headline,
                    url: item.url,
                    site: item.source,
                    snippet: item.summary,
                    published_at: item
                        .datetime
                        .and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
                })
                .collect(),
        ))
    }
}

#[async_trait]
impl SourceAdapter for FinnhubProvider {
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
                let quote = self.fetch_quote_raw(key, key).await?;
                Ok(CategoryPayload::Quote(Self::to_quote_record(quote, key)))
            }
            DataCategory::AlternativeAsset => {
                // Finnhub quotes crypto via exchange-prefixed pairs, e.g.
                // BTCUSD -> BINANCE:BTCUSDT.
                let symbol = if key.contains(':') {
                    key.to_string()
                } else {
                    let base = key.strip_suffix("USD").unwrap_or(key);
                    format!("BINANCE:{}USDT", base)
                };
                let quote = self.fetch_quote_raw(&symbol, key).await?;
                Ok(CategoryPayload::Spot(Self::to_quote_record(quote, key)))
            }
            DataCategory::MarketIndex => {
                let (symbol, name) = Self::index_lookup(key).ok_or_else(|| FetchError::NotFound {
                    key: key.to_string(),
                })?;
                let quote = self.fetch_quote_raw(symbol, key).await?;
                Ok(CategoryPayload::Index(IndexRecord {
                    symbol: key.to_string(),
                    name: Some(name.to_string()),
                    value: quote.c,
                    change: quote.d,
                    change_percent: quote.dp,
                }))
            }
            DataCategory::NewsArticle => self.fetch_news().await,
            other => Err(FetchError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("category {} not served by this adapter", other),
            }),
        }
    }
}
