use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::broker::ClientId;
use crate::domain::correlation::CorrelationId;
use crate::domain::data_source::DataSource;
use crate::domain::request::CalculationRequest;
use crate::domain::result::CalculationResult;
use crate::domain::ticker::Symbol;

/// Immutable, append-only regulatory record of one calculation.
///
/// Created once at the end of a successful calculation and never mutated
/// afterward; the storage contract prohibits updates and deletes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub ticker: Symbol,
    pub client_id: ClientId,
    pub position_value: Decimal,
    pub loan_days: u32,
    pub total_fee: Decimal,
    pub borrow_rate_used: Decimal,
    pub base_borrow_rate: Decimal,
    pub data_sources: Vec<DataSource>,
    pub correlation_id: CorrelationId,
    pub request_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

/// Optional request-scoped metadata attached to an audit record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestMetadata {
    pub request_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip: Option<String>,
}

impl AuditRecord {
    pub fn new(
        request: &CalculationRequest,
        result: &CalculationResult,
        data_sources: Vec<DataSource>,
        metadata: RequestMetadata,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            audit_id: Uuid::new_v4(),
            timestamp,
            ticker: request.ticker.clone(),
            client_id: request.client_id.clone(),
            position_value: request.position_value,
            loan_days: request.loan_days,
            total_fee: result.total_fee,
            borrow_rate_used: result.borrow_rate_used,
            base_borrow_rate: result.base_borrow_rate,
            data_sources,
            correlation_id: request.correlation_id.clone(),
            request_id: metadata.request_id,
            user_agent: metadata.user_agent,
            ip: metadata.ip,
        }
    }

    pub fn has_fallback(&self) -> bool {
        self.data_sources.iter().any(|source| source.is_fallback)
    }
}
