//! Market session calendar and injectable clock.
//!
//! Session state is a pure function of the instant against a fixed weekly
//! schedule in UTC. Exchange holidays are a known gap: a weekday holiday is
//! treated as a normal session day, which only makes thresholds tighter than
//! strictly necessary on those days.

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Source of "now" for everything in the engine.
///
/// Injected rather than called statically so tests can drive staleness and
/// session transitions with a controlled clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// US equity session buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarketSessionState {
    PreMarket,
    Open,
    AfterHours,
    Closed,
}

impl std::fmt::Display for MarketSessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreMarket => write!(f, "Pre-Market"),
            Self::Open => write!(f, "Open"),
            Self::AfterHours => write!(f, "After-Hours"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Weekly UTC schedule: weekends closed; weekdays 09-14 pre-market,
/// 14-21 open (9:30am-4pm ET to the nearest hour), otherwise after-hours.
pub fn session_state(now: DateTime<Utc>) -> MarketSessionState {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return MarketSessionState::Closed;
    }

    match now.hour() {
        9..=13 => MarketSessionState::PreMarket,
        14..=20 => MarketSessionState::Open,
        _ => MarketSessionState::AfterHours,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_weekday_open_hours() {
        // Wednesday 2026-08-05.
        assert_eq!(session_state(at(2026, 8, 5, 14, 0)), MarketSessionState::Open);
        assert_eq!(session_state(at(2026, 8, 5, 20, 59)), MarketSessionState::Open);
    }

    #[test]
    fn test_weekday_pre_market() {
        assert_eq!(
            session_state(at(2026, 8, 5, 9, 0)),
            MarketSessionState::PreMarket
        );
        assert_eq!(
            session_state(at(2026, 8, 5, 13, 59)),
            MarketSessionState::PreMarket
        );
    }

    #[test]
    fn test_weekday_after_hours_wraps_midnight() {
        assert_eq!(
            session_state(at(2026, 8, 5, 21, 0)),
            MarketSessionState::AfterHours
        );
        assert_eq!(
            session_state(at(2026, 8, 5, 3, 30)),
            MarketSessionState::AfterHours
        );
    }

    #[test]
    fn test_weekend_closed_all_day() {
        // Saturday 2026-08-08, including hours that would be open on a weekday.
        assert_eq!(session_state(at(2026, 8, 8, 15, 0)), MarketSessionState::Closed);
        assert_eq!(session_state(at(2026, 8, 9, 10, 0)), MarketSessionState::Closed);
    }

    #[test]
    fn test_system_clock_advances() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
