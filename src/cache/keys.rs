//! Cache key construction and prefix -> TTL resolution.
//!
//! Keys are colon-separated with the entity type as the first segment.

use std::time::Duration;

use crate::config::CacheConfig;
use crate::domain::ClientId;

pub fn borrow_rate_key(ticker: &str) -> String {
    format!("borrow_rate:{ticker}")
}

pub fn volatility_key(ticker: &str) -> String {
    format!("volatility:{ticker}")
}

pub fn event_risk_key(ticker: &str) -> String {
    format!("event_risk:{ticker}")
}

pub fn broker_config_key(client_id: &ClientId) -> String {
    format!("broker_config:{}", client_id.0)
}

pub fn calculation_key(ticker: &str, client_id: &ClientId, position_value: &str, loan_days: u32) -> String {
    format!("calculation:{ticker}:{}:{position_value}:{loan_days}", client_id.0)
}

/// Resolves the default TTL for a key from its prefix (the segment before the
/// first `:`), defaulting to the calculation TTL for anything unrecognized.
pub fn ttl_for_key(key: &str, config: &CacheConfig) -> Duration {
    let prefix = key.split_once(':').map(|(prefix, _)| prefix).unwrap_or(key);
    match prefix {
        "borrow_rate" => config.borrow_rate_ttl,
        "volatility" => config.volatility_ttl,
        "event_risk" => config.event_risk_ttl,
        "broker_config" => config.broker_config_ttl,
        _ => config.calculation_ttl,
    }
}
