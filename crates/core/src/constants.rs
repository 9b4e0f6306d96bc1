//! Refresh engine configuration constants.

/// Seconds between scheduler wake-ups.
pub const SCHEDULER_TICK_SECS: u64 = 30;

/// Spacing between key refreshes within one proactive pass, so background
/// work leaves quota headroom for on-demand reads.
pub const KEY_SPACING_MS: u64 = 300;

/// Days news articles are kept before pruning.
pub const NEWS_RETENTION_DAYS: i64 = 7;

/// Days intraday bar records are kept before pruning.
pub const INTRADAY_BAR_RETENTION_DAYS: i64 = 30;

/// Days refresh outcome log rows are kept before pruning.
pub const OUTCOME_RETENTION_DAYS: i64 = 30;

/// Hours between retention prune passes.
pub const PRUNE_INTERVAL_HOURS: i64 = 24;

/// Index symbols kept warm by the scheduler.
pub const TRACKED_INDICES: [&str; 5] = ["SPX", "NDX", "DJI", "RUT", "VIX"];

/// Macro indicator keys kept warm by the scheduler.
pub const TRACKED_MACRO_INDICATORS: [&str; 7] = [
    "US_10Y_YIELD",
    "US_2Y_YIELD",
    "FED_FUNDS_RATE",
    "UNEMPLOYMENT",
    "CPI_YOY",
    "CORE_PCE_YOY",
    "GDP_GROWTH",
];

/// News feed keys kept warm by the scheduler.
pub const TRACKED_NEWS_FEEDS: [&str; 2] = ["general", "stock-latest"];

/// Natural key of the sector performance snapshot.
pub const SECTOR_SNAPSHOT_KEY: &str = "snapshot";

/// Natural key of the earnings calendar window.
pub const EARNINGS_CALENDAR_KEY: &str = "calendar";
