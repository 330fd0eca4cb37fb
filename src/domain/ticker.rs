use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::impl_from_primitive;

static TICKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{1,5}$").expect("ticker pattern is valid"));

/// Validated uppercase ticker symbol, 1-5 letters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(pub String);
impl_from_primitive!(Symbol, String);

impl Symbol {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if !TICKER_PATTERN.is_match(raw) {
            return Err(ValidationError::field(
                "ticker",
                "must match ^[A-Z]{1,5}$",
            ));
        }
        Ok(Self(raw.to_string()))
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Securities-lending reference data for one ticker. Immutable from the
/// core's perspective; updated out-of-band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub min_borrow_rate: Decimal,
    pub lender_api_id: String,
}

impl Ticker {
    pub fn new(symbol: Symbol, min_borrow_rate: Decimal, lender_api_id: impl Into<String>) -> Self {
        Self {
            symbol,
            min_borrow_rate,
            lender_api_id: lender_api_id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_to_five_uppercase_letters() {
        assert!(Symbol::parse("A").is_ok());
        assert!(Symbol::parse("AAPL").is_ok());
        assert!(Symbol::parse("GME").is_ok());
    }

    #[test]
    fn rejects_lowercase_numbers_and_overlong_symbols() {
        assert!(Symbol::parse("aapl").is_err());
        assert!(Symbol::parse("AAPL1").is_err());
        assert!(Symbol::parse("TOOLONG").is_err());
        assert!(Symbol::parse("").is_err());
    }
}
