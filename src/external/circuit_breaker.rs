//! Per-provider circuit breaker: CLOSED -> OPEN -> HALF_OPEN -> CLOSED|OPEN.
//!
//! State is a single `Mutex`-guarded struct per provider so every transition is a
//! constant-time, internally synchronized update.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::CircuitBreakerConfig;
use crate::error::ExternalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct Inner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
    /// While HALF_OPEN, only one caller at a time is admitted as the probe.
    probe_in_flight: bool,
}

/// A gate in front of one upstream provider that fails fast once the provider
/// has shown `failure_threshold` consecutive failures, and self-heals after
/// `cool_down` via a single probe request.
pub struct CircuitBreaker {
    provider: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

/// What the caller should do given the circuit's current admission decision.
pub enum Admission {
    /// Proceed with the call normally.
    Allowed,
    /// Proceed, but this call is the HALF_OPEN probe: its outcome decides the next state.
    Probe,
    /// Fail fast without making the call.
    Rejected,
}

impl CircuitBreaker {
    pub fn new(provider: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            provider: provider.into(),
            config,
            inner: Mutex::new(Inner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
                probe_in_flight: false,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.inner.lock().expect("circuit breaker mutex poisoned").state
    }

    /// Decides whether a call may proceed, transitioning OPEN -> HALF_OPEN when
    /// the cool-down window has elapsed.
    pub fn admit(&self) -> Admission {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::Open => {
                let elapsed = inner.opened_at.map(|at| at.elapsed()).unwrap_or(Duration::ZERO);
                if elapsed >= self.config.cool_down {
                    inner.state = CircuitState::HalfOpen;
                    inner.probe_in_flight = true;
                    debug!(provider = %self.provider, "circuit transitioning OPEN -> HALF_OPEN");
                    Admission::Probe
                } else {
                    Admission::Rejected
                }
            }
            CircuitState::HalfOpen => {
                if inner.probe_in_flight {
                    Admission::Rejected
                } else {
                    inner.probe_in_flight = true;
                    Admission::Probe
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                debug!(provider = %self.provider, "circuit probe succeeded, closing");
                inner.state = CircuitState::Closed;
                inner.consecutive_failures = 0;
                inner.opened_at = None;
                inner.probe_in_flight = false;
            }
            CircuitState::Closed => {
                inner.consecutive_failures = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Records a failed call, opening the circuit once the threshold is reached.
    pub fn record_failure(&self) {
        let mut inner = self.inner.lock().expect("circuit breaker mutex poisoned");
        match inner.state {
            CircuitState::HalfOpen => {
                warn!(provider = %self.provider, "circuit probe failed, reopening");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.probe_in_flight = false;
            }
            CircuitState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.config.failure_threshold {
                    warn!(
                        provider = %self.provider,
                        failures = inner.consecutive_failures,
                        "circuit opening after consecutive failures"
                    );
                    inner.state = CircuitState::Open;
                    inner.opened_at = Some(Instant::now());
                }
            }
            CircuitState::Open => {}
        }
    }

    pub fn rejection_error(&self) -> ExternalError {
        ExternalError::CircuitOpen {
            provider: self.provider.clone(),
        }
    }
}
