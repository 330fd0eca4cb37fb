use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::impl_from_primitive;

/// Opaque identifier propagated through every log line, outbound upstream call,
/// and audit record for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(pub String);
impl_from_primitive!(CorrelationId, String);

impl CorrelationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::generate()
    }
}
