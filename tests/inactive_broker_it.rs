//! End-to-end rejection scenario: the broker exists but is deactivated, so the
//! coordinator must reject before touching any external provider and must not
//! persist an audit record for the rejected request.

mod common;

use locate_pricing_engine::domain::{CalculationRequestInput, RequestMetadata};
use locate_pricing_engine::error::{NotFoundError, PricingError};
use rust_decimal_macros::dec;
use std::sync::Arc;

#[tokio::test]
async fn it_test() {
    let (coordinator, tickers, brokers, audit) = common::build_coordinator(
        Arc::new(common::AlwaysDownBorrowRateProvider),
        Arc::new(common::NoSignalProvider),
        Arc::new(common::NoSignalProvider),
    );
    common::register_aapl(&tickers, dec!(0.01));
    brokers
        .insert(locate_pricing_engine::domain::BrokerConfig {
            client_id: locate_pricing_engine::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: locate_pricing_engine::domain::TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: false,
        })
        .unwrap();

    let err = coordinator
        .calculate(
            CalculationRequestInput {
                ticker: "AAPL".into(),
                position_value: dec!(100000),
                loan_days: 30,
                client_id: "client_123".into(),
            },
            None,
            RequestMetadata::default(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 403);
    assert_eq!(err.error_code(), "CLIENT_INACTIVE");
    assert!(matches!(
        err,
        PricingError::NotFound(NotFoundError::ClientInactive(ref client)) if client == "client_123"
    ));
    assert!(audit.all().is_empty());
}
