//! Immutable audit trail for every calculation, with compliance queries and
//! read-only fallback-usage analysis.

pub mod analysis;
pub mod query;
pub mod sink;

pub use analysis::{
    fallback_frequency, per_ticker_fallback_counts, rate_difference, top_fallback_sources, FallbackFrequency,
};
pub use query::{query, AuditPage, AuditQueryFilter, Pagination};
pub use sink::{AuditSink, AuditStatus, InMemoryAuditSink};
