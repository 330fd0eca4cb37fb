use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::data_source::DataSource;

/// Resolved external values for one calculation, each with its own provenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateContext {
    pub base_rate: Decimal,
    pub base_rate_source: DataSource,
    pub volatility_index: Option<Decimal>,
    pub volatility_source: Option<DataSource>,
    pub event_risk_factor: Option<u8>,
    pub event_risk_source: Option<DataSource>,
}

impl RateContext {
    pub fn data_sources(&self) -> Vec<(&'static str, &DataSource)> {
        let mut sources = vec![("borrow_rate", &self.base_rate_source)];
        if let Some(source) = &self.volatility_source {
            sources.push(("volatility", source));
        }
        if let Some(source) = &self.event_risk_source {
            sources.push(("event_risk", source));
        }
        sources
    }

    /// True if any resolved signal was substituted via fallback.
    pub fn has_fallback(&self) -> bool {
        self.data_sources().iter().any(|(_, source)| source.is_fallback)
    }
}

/// Decomposition of the total fee. Invariant: the three fields sum
/// exactly to `total_fee` after money-precision quantization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub borrow_cost: Decimal,
    pub markup: Decimal,
    pub transaction_fees: Decimal,
}

impl FeeBreakdown {
    pub fn total(&self) -> Decimal {
        self.borrow_cost + self.markup + self.transaction_fees
    }
}

/// Final output of the [`crate::engine::CalculationEngine`] for one request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub total_fee: Decimal,
    pub breakdown: FeeBreakdown,
    pub borrow_rate_used: Decimal,
    pub base_borrow_rate: Decimal,
    pub volatility_adjustment: Option<Decimal>,
    pub event_risk_adjustment: Option<Decimal>,
    pub annualized_rate: Decimal,
    pub time_factor: Decimal,
}
