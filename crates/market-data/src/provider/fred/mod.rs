//! FRED (Federal Reserve Economic Data) adapter for macro indicators.
//!
//! Serves the `macro-indicator` category from `/fred/series/observations`.
//! Indicator keys map to FRED series ids through a fixed registry; YoY
//! indicators (CPI, core PCE) are derived from the level series using the
//! observation twelve months back.
//!
//! API documentation: https://fred.stlouisfed.org/docs/api/fred/

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Days, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{CategoryPayload, DataCategory, MacroRecord};
use crate::provider::SourceAdapter;
use crate::registry::{AdapterQuota, SlidingWindowLimiter};

const BASE_URL: &str = "https://api.stlouisfed.org/fred";
const PROVIDER_ID: &str = "FRED";

const REQUESTS_PER_MINUTE: u32 = 120;

/// History window fetched per series. Three years covers the 13 monthly
/// observations YoY derivation needs, with slack for revisions.
const OBSERVATION_LOOKBACK_DAYS: u64 = 1095;

const SUPPORTED: [DataCategory; 1] = [DataCategory::MacroIndicator];

/// One entry in the indicator registry.
struct SeriesSpec {
    indicator: &'static str,
    series_id: &'static str,
    name: &'static str,
    unit: &'static str,
    /// Derive year-over-year percent change instead of serving the level.
    year_over_year: bool,
}

/// Indicator registry: our key -> FRED series.
const SERIES: [SeriesSpec; 7] = [
    SeriesSpec {
        indicator: "US_10Y_YIELD",
        series_id: "DGS10",
        name: "US 10Y Treasury Yield",
        unit: "%",
        year_over_year: false,
    },
    SeriesSpec {
        indicator: "US_2Y_YIELD",
        series_id: "DGS2",
        name: "US 2Y Treasury Yield",
        unit: "%",
        year_over_year: false,
    },
    SeriesSpec {
        indicator: "FED_FUNDS_RATE",
        series_id: "DFF",
        name: "Fed Funds Rate",
        unit: "%",
        year_over_year: false,
    },
    SeriesSpec {
        indicator: "UNEMPLOYMENT",
        series_id: "UNRATE",
        name: "Unemployment Rate",
        unit: "%",
        year_over_year: false,
    },
    SeriesSpec {
        indicator: "CPI_YOY",
        series_id: "CPIAUCSL",
        name: "CPI (YoY)",
        unit: "%",
        year_over_year: true,
    },
    SeriesSpec {
        indicator: "CORE_PCE_YOY",
        series_id: "PCEPILFE",
        name: "Core PCE (YoY)",
        unit: "%",
        year_over_year: true,
    },
    SeriesSpec {
        indicator: "GDP_GROWTH",
        series_id: "A191RL1Q225SBEA",
        name: "GDP Growth (QoQ Annual)",
        unit: "%",
        year_over_year: false,
    },
];

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

/// FRED reports missing observations as the literal string ".".
#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

/// Parsed, non-missing observation.
#[derive(Debug, Clone, Copy)]
struct Point {
    date: NaiveDate,
    value: Decimal,
}

/// FRED adapter.
pub struct FredProvider {
    client: Client,
    api_key: String,
    limiter: SlidingWindowLimiter,
}

impl FredProvider {
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

    fn spec_for(indicator: &str) -> Option<&'static SeriesSpec> {
        SERIES.iter().find(|s| s.indicator == indicator)
    }

    async fn fetch_observations(&self, series_id: &str) -> Result<Vec<Point>, FetchError> {
        self.limiter.acquire().await;

        let start = Utc::now()
            .date_naive()
            .checked_sub_days(Days::new(OBSERVATION_LOOKBACK_DAYS))
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default();

        debug!("FRED request: series {}", series_id);

        let response = self
            .client
            .get(format!("{}/series/observations", BASE_URL))
            .query(&[
                ("series_id", series_id),
                ("api_key", self.api_key.as_str()),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
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

        let parsed: ObservationsResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: e.to_string(),
            })?;

        Ok(parsed
            .observations
            .into_iter()
            .filter_map(|obs| {
                let date = NaiveDate::parse_from_str(&obs.date, "%Y-%m-%d").ok()?;
                // "." marks a missing observation; drop it rather than
                // substituting anything.
                let value = obs.value.trim().parse::<Decimal>().ok()?;
                Some(Point { date, value })
            })
            .collect())
    }

    /// Build the macro record from the observation tail. Returns `None`
    /// values (not substitutes) when the series is too short to derive.
    fn derive_record(spec: &SeriesSpec, points: &[Point]) -> MacroRecord {
        let (value, change, observed_on) = if spec.year_over_year {
            (
                yoy_at(points, 1),
                match (yoy_at(points, 1), yoy_at(points, 2)) {
                    (Some(current), Some(previous)) => Some(current - previous),
                    _ => None,
                },
                points.last().map(|p| p.date),
            )
        } else {
            let current = points.last().map(|p| p.value);
            let previous = points.len().checked_sub(2).and_then(|i| points.get(i)).map(|p| p.value);
            (
                current,
                match (current, previous) {
                    (Some(c), Some(p)) => Some(c - p),
                    _ => None,
                },
                points.last().map(|p| p.date),
            )
        };

        MacroRecord {
            series_id: spec.indicator.to_string(),
            name: Some(spec.name.to_string()),
            value,
            change,
            unit: Some(spec.unit.to_string()),
            observed_on,
        }
    }
}

/// Year-over-year percent change ending `offset_from_end` observations from
/// the tail (1 = latest). Needs twelve monthly observations of history.
fn yoy_at(points: &[Point], offset_from_end: usize) -> Option<Decimal> {
    let len = points.len();
    let current = points.get(len.checked_sub(offset_from_end)?)?;
    let year_ago = points.get(len.checked_sub(offset_from_end + 12)?)?;
    if year_ago.value.is_zero() {
        return None;
    }
    Some((current.value - year_ago.value) / year_ago.value * Decimal::from(100))
}

#[async_trait]
impl SourceAdapter for FredProvider {
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
        if category != DataCategory::MacroIndicator {
            return Err(FetchError::Malformed {
                provider: PROVIDER_ID.to_string(),
                message: format!("category {} not served by this adapter", category),
            });
        }

        let spec = Self::spec_for(key).ok_or_else(|| FetchError::NotFound {
            key: key.to_string(),
        })?;

        let points = self.fetch_observations(spec.series_id).await?;
        if points.is_empty() {
            return Err(FetchError::NotFound {
                key: key.to_string(),
            });
        }

        Ok(CategoryPayload::Macro(Self::derive_record(spec, &points)))
    }
}
