//! Fixed-precision arithmetic helpers. Floating-point is forbidden
//! anywhere in the pricing pipeline; every value that flows through the
//! engine is a [`Decimal`].

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

/// Decimal places used for borrow rates, adjustments, and time factors.
pub const RATE_SCALE: u32 = 4;

/// Decimal places used for dollar amounts.
pub const MONEY_SCALE: u32 = 2;

/// Quantizes a rate to [`RATE_SCALE`] decimal places using half-to-even rounding.
///
/// Intermediate results retain full precision; this is only applied at the
/// display/storage boundary.
pub fn quantize_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Quantizes a money amount to [`MONEY_SCALE`] decimal places using half-to-even rounding.
pub fn quantize_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Prorates an annualized rate to a loan period: `annual_rate * (loan_days / 365)`.
///
/// Computed entirely in `Decimal`; the division by 365 is never rounded before
/// multiplying by `annual_rate` so no precision is lost ahead of the final quantization.
pub fn annualize_to_period(annual_rate: Decimal, loan_days: u32) -> Decimal {
    let time_factor = time_factor(loan_days);
    annual_rate * time_factor
}

/// `loan_days / 365`, kept at full `Decimal` precision (not rounded).
pub fn time_factor(loan_days: u32) -> Decimal {
    Decimal::from(loan_days) / dec!(365)
}

/// Clamps `value` to the inclusive range `[min, max]`.
pub fn clamp(value: Decimal, min: Decimal, max: Decimal) -> Decimal {
    value.max(min).min(max)
}
