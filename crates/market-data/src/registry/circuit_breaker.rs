//! Per-source circuit breaker.
//!
//! Keeps a failing provider from being hammered by every refresh. Three
//! states per source: Closed (normal), Open (blocked), HalfOpen (probing
//! recovery). State is in-memory only and resets on restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(60);
const HALF_OPEN_SUCCESS_THRESHOLD: u32 = 2;

/// Circuit state for one source.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    failure_count: u32,
    half_open_successes: u32,
    last_failure: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            half_open_successes: 0,
            last_failure: None,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub recovery_timeout: Duration,
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            recovery_timeout: DEFAULT_RECOVERY_TIMEOUT,
            half_open_success_threshold: HALF_OPEN_SUCCESS_THRESHOLD,
        }
    }
}

/// Thread-safe breaker tracking one circuit per source id.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Recover from a poisoned mutex; stale circuit state beats a panic.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Whether requests to this source are currently allowed. Transitions
    /// Open -> HalfOpen once the recovery timeout has elapsed.
    pub fn is_allowed(&self, source: &str) -> bool {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source.to_string()).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed | CircuitState::HalfOpen => true,
            CircuitState::Open => {
                if let Some(last_failure) = circuit.last_failure {
                    if last_failure.elapsed() >= self.config.recovery_timeout {
                        info!("circuit for '{}' moving Open -> HalfOpen", source);
                        circuit.state = CircuitState::HalfOpen;
                        circuit.half_open_successes = 0;
                        return true;
                    }
                }
                false
            }
        }
    }

    /// Record a successful call.
    pub fn record_success(&self, source: &str) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source.to_string()).or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => {
                circuit.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                circuit.half_open_successes += 1;
                if circuit.half_open_successes >= self.config.half_open_success_threshold {
                    info!(
                        "circuit for '{}' closing after {} probe successes",
                        source, circuit.half_open_successes
                    );
                    *circuit = Circuit::new();
                }
            }
            CircuitState::Open => {
                debug!("unexpected success for '{}' while Open", source);
            }
        }
    }

    /// Record a failed call. Any failure while HalfOpen reopens immediately.
    pub fn record_failure(&self, source: &str) {
        let mut circuits = self.lock_circuits();
        let circuit = circuits.entry(source.to_string()).or_insert_with(Circuit::new);

        circuit.failure_count += 1;
        circuit.last_failure = Some(Instant::now());

        match circuit.state {
            CircuitState::Closed => {
                if circuit.failure_count >= self.config.failure_threshold {
                    info!(
                        "circuit for '{}' opening after {} failures",
                        source, circuit.failure_count
                    );
                    circuit.state = CircuitState::Open;
                }
            }
            CircuitState::HalfOpen => {
                info!("circuit for '{}' reopening after probe failure", source);
                circuit.state = CircuitState::Open;
                circuit.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Current state for a source.
    pub fn state(&self, source: &str) -> CircuitState {
        self.lock_circuits()
            .get(source)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Reset one source's circuit to Closed.
    pub fn reset(&self, source: &str) {
        if let Some(circuit) = self.lock_circuits().get_mut(source) {
            *circuit = Circuit::new();
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
