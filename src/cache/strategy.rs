//! Cache strategies: single-tier, tiered primary/secondary with promotion
//! and per-backend graceful degradation, and a no-op null strategy.
//!
//! Grounded directly on the pricing engine's `CacheStrategy` hierarchy: a
//! `SingleCacheStrategy` delegating straight to one backend, a
//! `TieredCacheStrategy` that reads primary-then-secondary (promoting a secondary
//! hit back into primary) and writes/deletes/flushes both independently so a
//! failure in one tier never blocks the other, and a `NullCacheStrategy` that
//! always misses.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::cache::backend::CacheBackend;
use crate::cache::keys::ttl_for_key;
use crate::cache::stored_value::StoredValue;
use crate::config::CacheConfig;
use crate::error::CacheError;

/// Raw get/set/delete/exists/flush over whatever tier topology a concrete
/// strategy implements. Operates on [`StoredValue`] envelopes; [`Cache`] layers
/// typed (de)serialization and freshness checks on top.
#[async_trait]
pub trait CacheStrategy: Send + Sync {
    async fn get(&self, key: &str) -> Option<StoredValue>;
    async fn set(&self, key: &str, value: StoredValue) -> bool;
    async fn delete(&self, key: &str) -> bool;
    async fn exists(&self, key: &str) -> bool;
    async fn flush(&self) -> bool;
}

/// Delegates straight to one backend.
pub struct SingleCacheStrategy {
    backend: Arc<dyn CacheBackend>,
}

impl SingleCacheStrategy {
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        debug!(backend = backend.name(), "initialized single-tier cache strategy");
        Self { backend }
    }
}

#[async_trait]
impl CacheStrategy for SingleCacheStrategy {
    async fn get(&self, key: &str) -> Option<StoredValue> {
        self.backend.get(key).await.unwrap_or_else(|err| {
            warn!(backend = self.backend.name(), %err, "cache get failed");
            None
        })
    }

    async fn set(&self, key: &str, value: StoredValue) -> bool {
        match self.backend.set(key, value).await {
            Ok(()) => true,
            Err(err) => {
                warn!(backend = self.backend.name(), %err, "cache set failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> bool {
        self.backend.delete(key).await.unwrap_or(false)
    }

    async fn exists(&self, key: &str) -> bool {
        self.backend.exists(key).await.unwrap_or(false)
    }

    async fn flush(&self) -> bool {
        self.backend.flush().await.is_ok()
    }
}

/// Primary (fast) tier backed by `secondary` (durable): reads try primary then
/// secondary, promoting a secondary hit back into primary; writes/deletes/flushes
/// hit both tiers independently so a failure in either never masks the other.
pub struct TieredCacheStrategy {
    primary: Arc<dyn CacheBackend>,
    secondary: Arc<dyn CacheBackend>,
    config: CacheConfig,
}

impl TieredCacheStrategy {
    pub fn new(primary: Arc<dyn CacheBackend>, secondary: Arc<dyn CacheBackend>, config: CacheConfig) -> Self {
        debug!(
            primary = primary.name(),
            secondary = secondary.name(),
            "initialized tiered cache strategy"
        );
        Self {
            primary,
            secondary,
            config,
        }
    }
}

#[async_trait]
impl CacheStrategy for TieredCacheStrategy {
    async fn get(&self, key: &str) -> Option<StoredValue> {
        match self.primary.get(key).await {
            Ok(Some(value)) => {
                debug!(key, "cache hit in primary tier");
                return Some(value);
            }
            Ok(None) => {}
            Err(err) => warn!(backend = self.primary.name(), %err, "primary tier get failed"),
        }

        debug!(key, "cache miss in primary tier, trying secondary");
        let value = match self.secondary.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(backend = self.secondary.name(), %err, "secondary tier get failed");
                None
            }
        };

        if let Some(value) = &value {
            debug!(key, "cache hit in secondary tier, promoting to primary");
            if let Err(err) = self.primary.set(key, value.clone()).await {
                warn!(backend = self.primary.name(), %err, "failed to promote value to primary tier");
            }
        }
        value
    }

    async fn set(&self, key: &str, value: StoredValue) -> bool {
        let primary_ok = self.primary.set(key, value.clone()).await.is_ok();
        if !primary_ok {
            warn!(backend = self.primary.name(), key, "failed to set key in primary tier");
        }
        let secondary_ok = self.secondary.set(key, value).await.is_ok();
        if !secondary_ok {
            warn!(backend = self.secondary.name(), key, "failed to set key in secondary tier");
        }
        primary_ok || secondary_ok
    }

    async fn delete(&self, key: &str) -> bool {
        let primary_ok = self.primary.delete(key).await.unwrap_or(false);
        let secondary_ok = self.secondary.delete(key).await.unwrap_or(false);
        primary_ok || secondary_ok
    }

    async fn exists(&self, key: &str) -> bool {
        if self.primary.exists(key).await.unwrap_or(false) {
            return true;
        }
        self.secondary.exists(key).await.unwrap_or(false)
    }

    async fn flush(&self) -> bool {
        let primary_ok = self.primary.flush().await.is_ok();
        let secondary_ok = self.secondary.flush().await.is_ok();
        primary_ok || secondary_ok
    }
}

/// No-op strategy: every `get` misses, every write/delete/flush reports success.
/// Used to disable caching outright (tests, or a deliberately cache-free deployment).
pub struct NullCacheStrategy;

impl NullCacheStrategy {
    pub fn new() -> Self {
        debug!("initialized null cache strategy, caching disabled");
        Self
    }
}

impl Default for NullCacheStrategy {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStrategy for NullCacheStrategy {
    async fn get(&self, _key: &str) -> Option<StoredValue> {
        None
    }

    async fn set(&self, _key: &str, _value: StoredValue) -> bool {
        true
    }

    async fn delete(&self, _key: &str) -> bool {
        true
    }

    async fn exists(&self, _key: &str) -> bool {
        false
    }

    async fn flush(&self) -> bool {
        true
    }
}

/// Typed facade over a [`CacheStrategy`]: (de)serializes values to JSON and
/// applies the freshness/staleness rules on top of the raw
/// envelope operations.
pub struct Cache {
    strategy: Arc<dyn CacheStrategy>,
    config: CacheConfig,
}

impl Cache {
    pub fn new(strategy: Arc<dyn CacheStrategy>, config: CacheConfig) -> Self {
        Self { strategy, config }
    }

    /// Returns a fresh cached value, or `None` on miss or staleness.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let stored = self.strategy.get(key).await?;
        if !stored.is_fresh(ttl_for_key(key, &self.config), chrono::Utc::now()) {
            return None;
        }
        serde_json::from_value(stored.payload).ok()
    }

    /// Returns a cached value even if stale, as long as it falls within
    /// `stale_window_multiplier` times its TTL,
    /// alongside the source it was originally stored under.
    pub async fn get_stale(&self, key: &str) -> Option<(serde_json::Value, String)> {
        let stored = self.strategy.get(key).await?;
        let default_ttl = ttl_for_key(key, &self.config);
        let window = default_ttl * self.config.stale_window_multiplier;
        if !stored.is_within(window, chrono::Utc::now()) {
            return None;
        }
        Some((stored.payload, stored.source))
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, source: impl Into<String>, ttl: Option<Duration>) {
        let Ok(payload) = serde_json::to_value(value) else {
            warn!(key, "failed to serialize value for caching");
            return;
        };
        self.strategy.set(key, StoredValue::new(payload, source, ttl)).await;
    }

    pub async fn delete(&self, key: &str) -> bool {
        self.strategy.delete(key).await
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.strategy.exists(key).await
    }

    pub async fn flush(&self) -> bool {
        self.strategy.flush().await
    }
}
