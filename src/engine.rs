//! CalculationEngine: a pure function from validated inputs and a
//! resolved [`RateContext`] to a [`CalculationResult`]. No suspension points,
//! no I/O; every value that flows through here is a [`Decimal`].

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::broker::{BrokerConfig, TransactionFeeType};
use crate::domain::{CalculationResult, FeeBreakdown, RateContext, Ticker};
use crate::error::CalculationError;
use crate::math::{annualize_to_period, clamp, quantize_money, quantize_rate, time_factor};

/// At most 10 percentage points of volatility adjustment.
const VOLATILITY_ADJUSTMENT_CAP: Decimal = dec!(0.10);
const VOLATILITY_ADJUSTMENT_FACTOR: Decimal = dec!(0.01);
const EVENT_RISK_ADJUSTMENT_PER_POINT: Decimal = dec!(0.005);

pub struct CalculationEngine;

impl CalculationEngine {
    /// Runs the rate-adjustment-to-total-fee pipeline. `ticker` and `broker` must already be validated
    /// and active; `rate_context` must already be fully resolved (cache/provider/fallback).
    pub fn compute(
        ticker: &Ticker,
        broker: &BrokerConfig,
        position_value: Decimal,
        loan_days: u32,
        rate_context: &RateContext,
    ) -> Result<CalculationResult, CalculationError> {
        let volatility_adjustment = rate_context
            .volatility_index
            .map(|index| clamp(index * VOLATILITY_ADJUSTMENT_FACTOR, Decimal::ZERO, VOLATILITY_ADJUSTMENT_CAP));
        let event_risk_adjustment = rate_context
            .event_risk_factor
            .map(|factor| Decimal::from(factor) * EVENT_RISK_ADJUSTMENT_PER_POINT);

        let raw_rate = rate_context.base_rate
            + volatility_adjustment.unwrap_or(Decimal::ZERO)
            + event_risk_adjustment.unwrap_or(Decimal::ZERO);
        let final_rate = raw_rate.max(ticker.min_borrow_rate);

        if final_rate < ticker.min_borrow_rate {
            return Err(CalculationError::InvariantViolation(format!(
                "final_rate {final_rate} fell below ticker.min_borrow_rate {}",
                ticker.min_borrow_rate
            )));
        }

        let period = time_factor(loan_days);
        let period_rate = annualize_to_period(final_rate, loan_days);

        let borrow_cost = quantize_money(position_value * period_rate);
        let markup = quantize_money(borrow_cost * (broker.markup_percentage / Decimal::from(100)));
        let transaction_fees = match broker.transaction_fee_type {
            TransactionFeeType::Flat => broker.transaction_amount,
            TransactionFeeType::Percentage => {
                quantize_money(position_value * (broker.transaction_amount / Decimal::from(100)))
            }
        };
        let transaction_fees = quantize_money(transaction_fees);

        let breakdown = FeeBreakdown {
            borrow_cost,
            markup,
            transaction_fees,
        };
        let total_fee = breakdown.total();

        Ok(CalculationResult {
            total_fee,
            breakdown,
            borrow_rate_used: quantize_rate(final_rate),
            base_borrow_rate: quantize_rate(rate_context.base_rate),
            volatility_adjustment: volatility_adjustment.map(quantize_rate),
            event_risk_adjustment: event_risk_adjustment.map(quantize_rate),
            annualized_rate: quantize_rate(final_rate),
            time_factor: quantize_rate(period),
        })
    }
}
