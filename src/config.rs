//! Typed configuration for the pricing core, loaded once at process startup.
//!
//! The core never reads environment variables directly outside [`EngineConfig::from_env`];
//! every tunable named in the external-interfaces contract is a field here with the
//! specification's default.

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Base URL and deadline for a single upstream provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(with = "humantime_secs")]
    pub timeout: Duration,
}

impl ProviderConfig {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

/// Bounded-retry parameters: exponential backoff with jitter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    #[serde(with = "humantime_millis")]
    pub base_backoff: Duration,
    pub backoff_factor: u32,
    /// Jitter as a fraction of the computed backoff, e.g. 0.25 for ±25%.
    pub jitter_fraction: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(100),
            backoff_factor: 2,
            jitter_fraction: 0.25,
        }
    }
}

/// Circuit-breaker thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    #[serde(with = "humantime_secs")]
    pub cool_down: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cool_down: Duration::from_secs(30),
        }
    }
}

/// Per-prefix TTL overrides and the staleness multiplier used for fallback.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(with = "humantime_secs")]
    pub borrow_rate_ttl: Duration,
    #[serde(with = "humantime_secs")]
    pub volatility_ttl: Duration,
    #[serde(with = "humantime_secs")]
    pub event_risk_ttl: Duration,
    #[serde(with = "humantime_secs")]
    pub broker_config_ttl: Duration,
    #[serde(with = "humantime_secs")]
    pub calculation_ttl: Duration,
    /// Multiplier applied to a TTL to define the widened staleness window
    /// used when falling back to a stale cached borrow rate.
    pub stale_window_multiplier: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            borrow_rate_ttl: Duration::from_secs(300),
            volatility_ttl: Duration::from_secs(900),
            event_risk_ttl: Duration::from_secs(3600),
            broker_config_ttl: Duration::from_secs(1800),
            calculation_ttl: Duration::from_secs(60),
            stale_window_multiplier: 2,
        }
    }
}

/// Top-level engine configuration; every external-facing tunable lives here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub borrow_rate_provider: ProviderConfig,
    pub volatility_provider: ProviderConfig,
    pub event_calendar_provider: ProviderConfig,
    pub retry: RetryConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub cache: CacheConfig,
    /// Fallback of last resort when even a ticker's `min_borrow_rate` is unavailable.
    pub global_minimum_borrow_rate: Decimal,
    /// Maximum concurrent in-flight calculations before requests are rejected as busy.
    pub max_concurrent_calculations: usize,
    /// Requests per window before `RateLimited` is surfaced (an adjacent concern).
    pub rate_limit_threshold: u32,
    /// Deadline for one calculation's external resolution phase, propagated to every
    /// in-flight provider call; cancellation on elapse counts as failure.
    #[serde(with = "humantime_secs")]
    pub request_deadline: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            borrow_rate_provider: ProviderConfig::new(
                "https://seclend.example.com",
                Duration::from_secs(5),
            ),
            volatility_provider: ProviderConfig::new(
                "https://market.example.com",
                Duration::from_secs(5),
            ),
            event_calendar_provider: ProviderConfig::new(
                "https://events.example.com",
                Duration::from_secs(5),
            ),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            global_minimum_borrow_rate: dec!(0.01),
            max_concurrent_calculations: 256,
            rate_limit_threshold: 1000,
            request_deadline: Duration::from_secs(10),
        }
    }
}

impl EngineConfig {
    /// Loads configuration by layering environment variables over the built-in defaults.
    ///
    /// Mirrors the layered defaults -> environment pattern used across the pack's
    /// finance services; unset variables simply keep the default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("BORROW_RATE_API_URL") {
            config.borrow_rate_provider.base_url = url;
        }
        if let Ok(url) = std::env::var("VOLATILITY_API_URL") {
            config.volatility_provider.base_url = url;
        }
        if let Ok(url) = std::env::var("EVENT_CALENDAR_API_URL") {
            config.event_calendar_provider.base_url = url;
        }
        if let Ok(attempts) = std::env::var("RETRY_MAX_ATTEMPTS")
            && let Ok(parsed) = attempts.parse()
        {
            config.retry.max_attempts = parsed;
        }
        if let Ok(threshold) = std::env::var("CIRCUIT_BREAKER_FAILURE_THRESHOLD")
            && let Ok(parsed) = threshold.parse()
        {
            config.circuit_breaker.failure_threshold = parsed;
        }
        if let Ok(min_rate) = std::env::var("GLOBAL_MINIMUM_BORROW_RATE")
            && let Ok(parsed) = min_rate.parse()
        {
            config.global_minimum_borrow_rate = parsed;
        }
        if let Ok(threshold) = std::env::var("RATE_LIMIT_THRESHOLD")
            && let Ok(parsed) = threshold.parse()
        {
            config.rate_limit_threshold = parsed;
        }
        if let Ok(seconds) = std::env::var("REQUEST_DEADLINE_SECONDS")
            && let Ok(parsed) = seconds.parse()
        {
            config.request_deadline = Duration::from_secs(parsed);
        }

        config
    }
}

mod humantime_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

mod humantime_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_specification() {
        let config = EngineConfig::default();
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.cool_down, Duration::from_secs(30));
        assert_eq!(config.cache.borrow_rate_ttl, Duration::from_secs(300));
        assert_eq!(config.cache.calculation_ttl, Duration::from_secs(60));
    }

    #[test]
    fn from_env_overrides_only_set_variables() {
        // SAFETY: test runs single-threaded with respect to this variable.
        unsafe {
            std::env::set_var("RETRY_MAX_ATTEMPTS", "7");
        }
        let config = EngineConfig::from_env();
        assert_eq!(config.retry.max_attempts, 7);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        unsafe {
            std::env::remove_var("RETRY_MAX_ATTEMPTS");
        }
    }
}
