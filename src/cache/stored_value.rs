//! Envelope wrapped around every cached value.
//!
//! Staleness is judged against this timestamp rather than relying on the backend's
//! own expiration, so a [`crate::cache::strategy::Cache`] can still serve a value
//! from a *widened* staleness window when a provider is failing.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A JSON-encoded value plus the bookkeeping needed to judge freshness and provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredValue {
    pub payload: serde_json::Value,
    pub stored_at: DateTime<Utc>,
    pub source: String,
    /// TTL this entry was written with; `None` means "use the key's prefix default".
    pub ttl: Option<Duration>,
}

impl StoredValue {
    pub fn new(payload: serde_json::Value, source: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            payload,
            stored_at: Utc::now(),
            source: source.into(),
            ttl,
        }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        (now - self.stored_at).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether this entry is still fresh under `default_ttl` (used when the entry
    /// carries no TTL of its own) at time `now`.
    pub fn is_fresh(&self, default_ttl: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) <= self.ttl.unwrap_or(default_ttl)
    }

    /// Whether this entry is still usable as a stale fallback within `window`,
    /// irrespective of its own TTL.
    pub fn is_within(&self, window: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) <= window
    }
}
