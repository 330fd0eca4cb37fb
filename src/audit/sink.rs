//! AuditSink: exactly-one append per calculation, with a unidirectional
//! `NEW -> BUFFERED -> PERSISTED` (or `NEW -> FAILED`) state machine per record.
//!
//! A failed append never masks or corrupts the user-facing response: callers
//! surface the failure through an error counter while the calculation result
//! itself has already been returned.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{error, warn};
use uuid::Uuid;

use crate::domain::AuditRecord;
use crate::error::AuditError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    New,
    Buffered,
    Persisted,
    Failed,
}

/// Appends (and, for compliance queries, holds) audit records. Implementations
/// must treat updates/deletes as prohibited by the storage contract: once an
/// entry reaches `Persisted` it is immutable.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record, driving it through `New -> Buffered -> Persisted`
    /// (or `-> Failed`). Returns the terminal status rather than bubbling the
    /// error, since a persistence failure must never fail the calling request.
    async fn append(&self, record: AuditRecord) -> AuditStatus;

    fn status_of(&self, audit_id: Uuid) -> Option<AuditStatus>;

    fn get(&self, audit_id: Uuid) -> Option<AuditRecord>;

    fn all(&self) -> Vec<AuditRecord>;
}

/// Process-local audit store. Production deployments back this with a durable,
/// append-only table; this implementation keeps the same state machine
/// and query surface so the coordinator and compliance queries are unaffected
/// by which storage backend is behind [`AuditSink`].
pub struct InMemoryAuditSink {
    records: DashMap<Uuid, (AuditRecord, AuditStatus)>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
        }
    }
}

impl Default for InMemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, record: AuditRecord) -> AuditStatus {
        let audit_id = record.audit_id;
        self.records.insert(audit_id, (record, AuditStatus::New));

        if let Some(mut entry) = self.records.get_mut(&audit_id) {
            entry.1 = AuditStatus::Buffered;
        }

        match self.persist(audit_id) {
            Ok(()) => {
                if let Some(mut entry) = self.records.get_mut(&audit_id) {
                    entry.1 = AuditStatus::Persisted;
                }
                AuditStatus::Persisted
            }
            Err(err) => {
                error!(%audit_id, %err, "audit record failed to persist");
                if let Some(mut entry) = self.records.get_mut(&audit_id) {
                    entry.1 = AuditStatus::Failed;
                }
                AuditStatus::Failed
            }
        }
    }

    fn status_of(&self, audit_id: Uuid) -> Option<AuditStatus> {
        self.records.get(&audit_id).map(|entry| entry.1)
    }

    fn get(&self, audit_id: Uuid) -> Option<AuditRecord> {
        self.records.get(&audit_id).map(|entry| entry.0.clone())
    }

    fn all(&self) -> Vec<AuditRecord> {
        self.records.iter().map(|entry| entry.0.clone()).collect()
    }
}

impl InMemoryAuditSink {
    /// The in-memory backend has no durability to fail at; a real backend
    /// would attempt the write here and surface a [`AuditError::PersistenceFailed`].
    fn persist(&self, audit_id: Uuid) -> Result<(), AuditError> {
        if self.records.contains_key(&audit_id) {
            Ok(())
        } else {
            warn!(%audit_id, "attempted to persist an untracked audit record");
            Err(AuditError::PersistenceFailed {
                audit_id: audit_id.to_string(),
                reason: "record not buffered".to_string(),
            })
        }
    }
}
