//! Read-only aggregations over persisted audit records: fallback
//! frequency, the most frequently substituted sources, and the rate
//! difference between fallback and normal calculations.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::domain::{AuditRecord, Symbol};

/// Fallback usage across `records`: how many records used at least one
/// fallback source, and what fraction of the total that represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackFrequency {
    pub fallback_count: usize,
    pub total_count: usize,
    pub fallback_percentage: Decimal,
}

pub fn fallback_frequency(records: &[AuditRecord]) -> FallbackFrequency {
    let total_count = records.len();
    let fallback_count = records.iter().filter(|record| record.has_fallback()).count();
    let fallback_percentage = if total_count == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(fallback_count) / Decimal::from(total_count) * Decimal::from(100)
    };
    FallbackFrequency {
        fallback_count,
        total_count,
        fallback_percentage,
    }
}

/// The `limit` most frequently substituted source names across `records`,
/// ordered by descending count.
pub fn top_fallback_sources(records: &[AuditRecord], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        for source in &record.data_sources {
            if source.is_fallback {
                *counts.entry(source.source_name.clone()).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// The `limit` tickers with the most fallback-substituted records, ordered
/// by descending count (ties broken alphabetically).
pub fn per_ticker_fallback_counts(records: &[AuditRecord], limit: usize) -> Vec<(Symbol, usize)> {
    let mut counts: HashMap<Symbol, usize> = HashMap::new();
    for record in records {
        if record.has_fallback() {
            *counts.entry(record.ticker.clone()).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(Symbol, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

/// `average(borrow_rate_used over fallback records) - average(... over normal records)`.
/// `None` when either group is empty, matching the source's inability to form a
/// meaningful comparison without both sides.
pub fn rate_difference(records: &[AuditRecord]) -> Option<Decimal> {
    let (fallback, normal): (Vec<&AuditRecord>, Vec<&AuditRecord>) =
        records.iter().partition(|record| record.has_fallback());

    if fallback.is_empty() || normal.is_empty() {
        return None;
    }

    let avg = |group: &[&AuditRecord]| -> Decimal {
        group.iter().map(|record| record.borrow_rate_used).sum::<Decimal>() / Decimal::from(group.len())
    };

    Some(avg(&fallback) - avg(&normal))
}
