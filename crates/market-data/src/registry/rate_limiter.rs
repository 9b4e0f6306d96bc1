//! Sliding-window rate limiter for outbound provider calls.
//!
//! Each adapter owns one limiter sized to its provider's quota. The limiter
//! keeps the timestamps of calls made in the last 60 seconds; a call that
//! would exceed the quota waits until the oldest timestamp ages out of the
//! window. Quotas are per-provider, which is why the guard lives inside the
//! adapter rather than in the refresh orchestrator.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, warn};

/// Length of the quota window.
const WINDOW: Duration = Duration::from_secs(60);

/// Declared outbound quota for one provider.
#[derive(Clone, Copy, Debug)]
pub struct AdapterQuota {
    /// Maximum calls in any sliding 60-second window.
    pub requests_per_minute: u32,
}

impl Default for AdapterQuota {
    fn default() -> Self {
        Self {
            requests_per_minute: 60,
        }
    }
}

/// Sliding 60-second window limiter.
///
/// Thread-safe; the internal mutex is only held long enough to inspect or
/// update the call history, never across a sleep.
pub struct SlidingWindowLimiter {
    quota: u32,
    calls: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    pub fn new(quota: AdapterQuota) -> Self {
        Self {
            quota: quota.requests_per_minute.max(1),
            calls: Mutex::new(VecDeque::new()),
        }
    }

    /// Lock the call history, recovering from poison if necessary.
    ///
    /// The worst outcome of recovering is a slightly inaccurate window,
    /// which beats panicking inside an adapter.
    fn lock_calls(&self) -> MutexGuard<'_, VecDeque<Instant>> {
        self.calls.lock().unwrap_or_else(|poisoned| {
            warn!("rate limiter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Record a call if the window has room. Returns the wait time until a
    /// slot frees up otherwise.
    fn try_record(&self) -> Result<(), Duration> {
        let now = Instant::now();
        let mut calls = self.lock_calls();

        while let Some(front) = calls.front() {
            if now.duration_since(*front) >= WINDOW {
                calls.pop_front();
            } else {
                break;
            }
        }

        if (calls.len() as u32) < self.quota {
            calls.push_back(now);
            return Ok(());
        }

        // Oldest call in the window determines when a slot opens.
        match calls.front() {
            Some(oldest) => Err(WINDOW.saturating_sub(now.duration_since(*oldest))),
            None => {
                calls.push_back(now);
                Ok(())
            }
        }
    }

    /// Try to take a slot without waiting.
    pub fn try_acquire(&self) -> bool {
        self.try_record().is_ok()
    }

    /// Take a slot, sleeping until one is available.
    pub async fn acquire(&self) {
        loop {
            match self.try_record() {
                Ok(()) => return,
                Err(wait) => {
                    debug!("quota window full, waiting {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    /// Calls still available in the current window.
    pub fn remaining(&self) -> u32 {
        let now = Instant::now();
        let mut calls = self.lock_calls();
        while let Some(front) = calls.front() {
            if now.duration_since(*front) >= WINDOW {
                calls.pop_front();
            } else {
                break;
            }
        }
        self.quota.saturating_sub(calls.len() as u32)
    }
}
