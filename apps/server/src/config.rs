//! Environment configuration for the refresh daemon.

use alphastream_core::{Error, Result};

const DEFAULT_DATABASE_PATH: &str = "alphastream.db";
const DEFAULT_WATCHLIST: &str = "AAPL,MSFT,NVDA,AMZN,GOOGL,META,TSLA,BRK.B";

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Required. The process refuses to start without it.
    pub fmp_api_key: String,
    /// Optional; the Finnhub adapter is skipped when absent.
    pub finnhub_api_key: Option<String>,
    /// Optional; the FRED adapter is skipped when absent.
    pub fred_api_key: Option<String>,
    pub database_path: String,
    /// Equity tickers the scheduler keeps warm.
    pub watchlist: Vec<String>,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    ///
    /// A missing FMP credential is a fatal configuration error: it fails
    /// here, at process start, never at request time.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let fmp_api_key = std::env::var("FMP_API_KEY")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| Error::MissingConfigKey("FMP_API_KEY".to_string()))?;

        let optional = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
        };

        let watchlist_raw =
            std::env::var("WATCHLIST").unwrap_or_else(|_| DEFAULT_WATCHLIST.to_string());
        let watchlist: Vec<String> = watchlist_raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if watchlist.is_empty() {
            return Err(Error::InvalidConfigValue(
                "WATCHLIST must contain at least one ticker".to_string(),
            ));
        }

        Ok(Self {
            fmp_api_key,
            finnhub_api_key: optional("FINNHUB_API_KEY"),
            fred_api_key: optional("FRED_API_KEY"),
            database_path: std::env::var("DATABASE_PATH")
                .unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string()),
            watchlist,
        })
    }
}
