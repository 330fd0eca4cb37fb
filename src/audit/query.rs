//! Compliance queries over persisted audit records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{AuditRecord, ClientId, Symbol};

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 100;

/// Filter predicates for [`query`]. Every field is optional; an unset field
/// imposes no constraint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuditQueryFilter {
    pub client_id: Option<ClientId>,
    pub ticker: Option<Symbol>,
    pub timestamp_from: Option<DateTime<Utc>>,
    pub timestamp_to: Option<DateTime<Utc>>,
    pub position_value_min: Option<Decimal>,
    pub position_value_max: Option<Decimal>,
    pub rate_min: Option<Decimal>,
    pub rate_max: Option<Decimal>,
    /// When `true`, restricts to records where any `DataSource` has `is_fallback=true`.
    pub only_fallback: bool,
}

impl AuditQueryFilter {
    fn matches(&self, record: &AuditRecord) -> bool {
        if let Some(client_id) = &self.client_id
            && *client_id != record.client_id
        {
            return false;
        }
        if let Some(ticker) = &self.ticker
            && *ticker != record.ticker
        {
            return false;
        }
        if let Some(from) = self.timestamp_from
            && record.timestamp < from
        {
            return false;
        }
        if let Some(to) = self.timestamp_to
            && record.timestamp > to
        {
            return false;
        }
        if let Some(min) = self.position_value_min
            && record.position_value < min
        {
            return false;
        }
        if let Some(max) = self.position_value_max
            && record.position_value > max
        {
            return false;
        }
        if let Some(min) = self.rate_min
            && record.borrow_rate_used < min
        {
            return false;
        }
        if let Some(max) = self.rate_max
            && record.borrow_rate_used > max
        {
            return false;
        }
        if self.only_fallback && !record.has_fallback() {
            return false;
        }
        true
    }
}

/// Page/page_size pagination (defaults 1/50, capped at 100 per page).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// One page of matching records, plus the total match count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditPage {
    pub records: Vec<AuditRecord>,
    pub page: u32,
    pub page_size: u32,
    pub total: usize,
}

/// Filters `records` by `filter`, then slices out one page per `pagination`.
pub fn query(records: &[AuditRecord], filter: &AuditQueryFilter, pagination: Pagination) -> AuditPage {
    let matching: Vec<&AuditRecord> = records.iter().filter(|record| filter.matches(record)).collect();
    let total = matching.len();

    let start = ((pagination.page - 1) as usize) * (pagination.page_size as usize);
    let end = (start + pagination.page_size as usize).min(total);
    let page_records = if start >= total {
        Vec::new()
    } else {
        matching[start..end].iter().map(|record| (*record).clone()).collect()
    };

    AuditPage {
        records: page_records,
        page: pagination.page,
        page_size: pagination.page_size,
        total,
    }
}

/// Fetches a single record by `audit_id`.
pub fn find_by_id(records: &[AuditRecord], audit_id: uuid::Uuid) -> Option<AuditRecord> {
    records.iter().find(|record| record.audit_id == audit_id).cloned()
}
