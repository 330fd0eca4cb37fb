//! End-to-end circuit-breaker scenario: after enough consecutive borrow-rate
//! failures the breaker opens and fails fast, then admits a single probe once
//! the cool-down elapses. Each `calculate()` call still succeeds end-to-end
//! because the coordinator falls back to the ticker's minimum rate regardless
//! of whether the provider failure was a real call or a fast rejection.

mod common;

use locate_pricing_engine::config::CircuitBreakerConfig;
use locate_pricing_engine::domain::{CalculationRequestInput, RequestMetadata};
use locate_pricing_engine::external::{CircuitBreaker, CircuitState};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

/// Each call uses a distinct `loan_days` so the whole-calculation cache never
/// masks a repeat call to the borrow-rate provider; only the breaker's own
/// state carries across requests.
async fn run_once(coordinator: &locate_pricing_engine::PricingCoordinator, loan_days: i64) {
    coordinator
        .calculate(
            CalculationRequestInput {
                ticker: "AAPL".into(),
                position_value: dec!(100000),
                loan_days,
                client_id: "client_123".into(),
            },
            None,
            RequestMetadata::default(),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn it_test() {
    let provider = Arc::new(common::CircuitBreakingBorrowRateProvider::new(CircuitBreaker::new(
        "seclend_api",
        CircuitBreakerConfig {
            failure_threshold: 5,
            cool_down: Duration::from_millis(50),
        },
    )));
    let (coordinator, tickers, brokers, _audit) =
        common::build_coordinator(provider.clone(), Arc::new(common::NoSignalProvider), Arc::new(common::NoSignalProvider));
    common::register_aapl(&tickers, dec!(0.02));
    brokers.insert(common::demo_broker("client_123", dec!(5), dec!(25))).unwrap();

    // Five consecutive real calls open the circuit.
    for days in 1..=5 {
        run_once(&coordinator, days).await;
    }
    assert_eq!(provider.state(), CircuitState::Open);
    assert_eq!(provider.call_count(), 5);

    // The sixth request arrives while the circuit is open: the provider is
    // never actually called, only fast-rejected.
    run_once(&coordinator, 6).await;
    assert_eq!(provider.call_count(), 5);
    assert_eq!(provider.state(), CircuitState::Open);

    // Once the cool-down elapses a single probe is admitted; it fails here
    // too, so the circuit reopens.
    tokio::time::sleep(Duration::from_millis(60)).await;
    run_once(&coordinator, 7).await;
    assert_eq!(provider.call_count(), 6);
    assert_eq!(provider.state(), CircuitState::Open);
}
