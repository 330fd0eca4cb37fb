//! Raw key-value storage beneath a [`crate::cache::strategy::CacheStrategy`].

use async_trait::async_trait;
use dashmap::DashMap;

use crate::cache::stored_value::StoredValue;
use crate::error::CacheError;

/// A single cache tier. Implementations must be safe to share across an
/// unbounded number of concurrent callers without external locking.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError>;

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    async fn flush(&self) -> Result<(), CacheError>;
}

/// Process-local cache tier backed by a sharded concurrent map, used as the
/// primary (fast) tier and, standalone, as the whole cache in single-node
/// deployments.
pub struct InMemoryBackend {
    name: String,
    entries: DashMap<String, StoredValue>,
}

impl InMemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: DashMap::new(),
        }
    }
}

#[async_trait]
impl CacheBackend for InMemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<StoredValue>, CacheError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.contains_key(key))
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.entries.clear();
        Ok(())
    }
}
