use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::broker::ClientId;
use crate::domain::correlation::CorrelationId;
use crate::domain::ticker::Symbol;
use crate::error::ValidationError;

/// Raw request as it arrives at the boundary, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequestInput {
    pub ticker: String,
    pub position_value: Decimal,
    pub loan_days: i64,
    pub client_id: String,
}

/// A validated calculation request. Construction is the only way to obtain
/// one, so every downstream component can assume the invariants already hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationRequest {
    pub ticker: Symbol,
    pub position_value: Decimal,
    pub loan_days: u32,
    pub client_id: ClientId,
    pub correlation_id: CorrelationId,
}

impl CalculationRequest {
    /// Validates `input` against the request invariants, assigning `correlation_id`
    /// if the caller didn't already carry one from upstream.
    pub fn validate(
        input: CalculationRequestInput,
        correlation_id: Option<CorrelationId>,
    ) -> Result<Self, ValidationError> {
        if input.position_value <= Decimal::ZERO || input.position_value > Decimal::from(1_000_000_000i64)
        {
            return Err(ValidationError::field(
                "position_value",
                "must be > 0 and <= 1e9",
            ));
        }
        if input.loan_days < 1 || input.loan_days > 365 {
            return Err(ValidationError::field(
                "loan_days",
                "must be between 1 and 365",
            ));
        }
        let ticker = Symbol::parse(&input.ticker)?;
        let client_id = ClientId::parse(&input.client_id)?;

        Ok(Self {
            ticker,
            position_value: input.position_value,
            loan_days: input.loan_days as u32,
            client_id,
            correlation_id: correlation_id.unwrap_or_default(),
        })
    }
}
