//! Two-tier cache: a process-local tier and an optional shared remote
//! tier, composed behind a [`strategy::CacheStrategy`] and exposed through the
//! typed [`strategy::Cache`] facade.

pub mod backend;
pub mod keys;
pub mod strategy;
pub mod stored_value;

pub use backend::{CacheBackend, InMemoryBackend};
pub use strategy::{Cache, CacheStrategy, NullCacheStrategy, SingleCacheStrategy, TieredCacheStrategy};
pub use stored_value::StoredValue;
