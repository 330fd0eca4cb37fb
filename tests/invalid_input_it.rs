//! End-to-end rejection scenario: malformed input must fail validation before
//! any broker/ticker lookup or external provider call happens.

mod common;

use async_trait::async_trait;
use locate_pricing_engine::domain::{CalculationRequestInput, DataSource, RequestMetadata, Symbol};
use locate_pricing_engine::error::{ExternalError, PricingError, ValidationError};
use locate_pricing_engine::external::BorrowRateProvider;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

/// Fails the test if it's ever called; validation must short-circuit before
/// any provider is reached.
struct PanicsIfCalledProvider;

#[async_trait]
impl BorrowRateProvider for PanicsIfCalledProvider {
    async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        panic!("borrow rate provider must not be called for an invalid request");
    }
}

#[tokio::test]
async fn it_test() {
    let (coordinator, _tickers, _brokers, audit) = common::build_coordinator(
        Arc::new(PanicsIfCalledProvider),
        Arc::new(common::NoSignalProvider),
        Arc::new(common::NoSignalProvider),
    );

    let err = coordinator
        .calculate(
            CalculationRequestInput {
                ticker: "AAPL".into(),
                position_value: dec!(-1),
                loan_days: 30,
                client_id: "client_123".into(),
            },
            None,
            RequestMetadata::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "VALIDATION_ERROR");
    assert!(matches!(
        err,
        PricingError::Validation(ValidationError::FieldConstraint { ref field, .. }) if field == "position_value"
    ));
    assert!(audit.all().is_empty());
}
