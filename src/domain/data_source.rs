use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Where a resolved value ultimately came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum SourceType {
    Api,
    Cache,
    Database,
    Fallback,
}

/// Free-form metadata attached to a [`DataSource`] (endpoint, response time, cache hit, ttl).
///
/// Kept as an explicit, serializable map rather than `serde_json::Value` so callers
/// can't stash arbitrary nested structures, while still preserving the JSON shape
/// the persisted `data_sources` column expects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata(pub BTreeMap<String, String>);

impl SourceMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }
}

/// Provenance of one resolved value; travels with it through the pipeline and
/// is ultimately owned by the [`crate::domain::audit_record::AuditRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub source_name: String,
    pub source_type: SourceType,
    pub is_fallback: bool,
    pub timestamp: DateTime<Utc>,
    pub metadata: SourceMetadata,
}

impl DataSource {
    pub fn new(source_name: impl Into<String>, source_type: SourceType, timestamp: DateTime<Utc>) -> Self {
        Self {
            source_name: source_name.into(),
            source_type,
            is_fallback: matches!(source_type, SourceType::Fallback),
            timestamp,
            metadata: SourceMetadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: SourceMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn fallback(source_name: impl Into<String>, reason: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self::new(source_name, SourceType::Fallback, timestamp)
            .with_metadata(SourceMetadata::new().with("reason", reason.into()))
    }
}
