use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{DataSource, Symbol};
use crate::error::ExternalError;

/// Fetches the current annualized borrow rate for a ticker.
#[async_trait]
pub trait BorrowRateProvider: Send + Sync {
    async fn fetch_borrow_rate(&self, ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError>;
}

/// Fetches the current volatility index for a ticker.
#[async_trait]
pub trait VolatilityProvider: Send + Sync {
    async fn fetch_volatility(&self, ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError>;
}

/// Fetches the current event-risk factor (0-10) for a ticker.
#[async_trait]
pub trait EventRiskProvider: Send + Sync {
    async fn fetch_event_risk(&self, ticker: &Symbol) -> Result<(u8, DataSource), ExternalError>;
}
