//! Wire shapes consumed from upstream providers.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display, EnumString)]
pub enum BorrowStatus {
    #[strum(serialize = "EASY")]
    Easy,
    #[strum(serialize = "MEDIUM")]
    Medium,
    #[strum(serialize = "HARD")]
    Hard,
}

/// `GET /api/borrows/{ticker}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct BorrowRateResponse {
    pub ticker: String,
    pub rate: Decimal,
    pub status: BorrowStatus,
    pub timestamp: DateTime<Utc>,
}

/// `GET /api/market/volatility/{ticker}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct VolatilityResponse {
    pub ticker: String,
    pub volatility_index: Decimal,
    pub event_risk_factor: Option<u8>,
    pub timestamp: DateTime<Utc>,
}

/// One entry in `GET /api/events/{ticker}`'s `events` array.
#[derive(Debug, Clone, Deserialize)]
pub struct EconomicEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub date: DateTime<Utc>,
    pub risk_factor: u8,
}

/// `GET /api/events/{ticker}` response.
#[derive(Debug, Clone, Deserialize)]
pub struct EventCalendarResponse {
    pub ticker: String,
    pub events: Vec<EconomicEvent>,
    pub timestamp: DateTime<Utc>,
}

impl EventCalendarResponse {
    /// Event risk is the maximum `risk_factor` over future events, capped at 10.
    pub fn max_future_risk_factor(&self, now: DateTime<Utc>) -> u8 {
        self.events
            .iter()
            .filter(|event| event.date > now)
            .map(|event| event.risk_factor)
            .max()
            .unwrap_or(0)
            .min(10)
    }
}
