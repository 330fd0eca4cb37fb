use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::ValidationError;
use crate::impl_from_primitive;

static CLIENT_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,50}$").expect("client id pattern is valid"));

/// Validated broker/client identifier, 3-50 chars from `[A-Za-z0-9_-]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);
impl_from_primitive!(ClientId, String);

impl ClientId {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if !CLIENT_ID_PATTERN.is_match(raw) {
            return Err(ValidationError::field(
                "client_id",
                "must match ^[A-Za-z0-9_-]{3,50}$",
            ));
        }
        Ok(Self(raw.to_string()))
    }
}

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a broker's transaction fee is computed from the same inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
pub enum TransactionFeeType {
    #[strum(serialize = "FLAT")]
    Flat,
    #[strum(serialize = "PERCENTAGE")]
    Percentage,
}

/// Per-client broker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub client_id: ClientId,
    pub markup_percentage: Decimal,
    pub transaction_fee_type: TransactionFeeType,
    pub transaction_amount: Decimal,
    pub active: bool,
}

impl BrokerConfig {
    /// Markup in `[0, 100]`, `transaction_amount >= 0`, and `<= 100` when PERCENTAGE.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.markup_percentage < Decimal::ZERO || self.markup_percentage > Decimal::from(100) {
            return Err(ValidationError::field(
                "markup_percentage",
                "must be between 0 and 100",
            ));
        }
        if self.transaction_amount < Decimal::ZERO {
            return Err(ValidationError::field(
                "transaction_amount",
                "must be non-negative",
            ));
        }
        if self.transaction_fee_type == TransactionFeeType::Percentage
            && self.transaction_amount > Decimal::from(100)
        {
            return Err(ValidationError::field(
                "transaction_amount",
                "must not exceed 100 for PERCENTAGE fees",
            ));
        }
        Ok(())
    }
}
