pub mod audit_record;
pub mod broker;
pub mod correlation;
pub mod data_source;
pub mod request;
pub mod result;
pub mod ticker;

pub use audit_record::{AuditRecord, RequestMetadata};
pub use broker::{BrokerConfig, ClientId, TransactionFeeType};
pub use correlation::CorrelationId;
pub use data_source::{DataSource, SourceMetadata, SourceType};
pub use request::{CalculationRequest, CalculationRequestInput};
pub use result::{CalculationResult, FeeBreakdown, RateContext};
pub use ticker::{Symbol, Ticker};
