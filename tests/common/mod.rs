//! Shared fakes and wiring for the integration-style `*_it.rs` scenarios.
//!
//! Everything here is an in-memory fake reachable through the crate's public
//! API: no network, no real database, matching the unit-level fakes in
//! `coordinator.rs` but exposed for cross-file reuse.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use locate_pricing_engine::audit::InMemoryAuditSink;
use locate_pricing_engine::cache::{Cache, CacheBackend, InMemoryBackend, SingleCacheStrategy};
use locate_pricing_engine::config::{CacheConfig, EngineConfig};
use locate_pricing_engine::domain::{BrokerConfig, ClientId, DataSource, SourceType, Symbol, Ticker, TransactionFeeType};
use locate_pricing_engine::error::ExternalError;
use locate_pricing_engine::external::{Admission, BorrowRateProvider, CircuitBreaker, EventRiskProvider, VolatilityProvider};
use locate_pricing_engine::registry::{InMemoryBrokerRegistry, InMemoryTickerRegistry};
use locate_pricing_engine::PricingCoordinator;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct FixedBorrowRateProvider(pub Decimal);

#[async_trait]
impl BorrowRateProvider for FixedBorrowRateProvider {
    async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Ok((self.0, DataSource::new("seclend_api", SourceType::Api, Utc::now())))
    }
}

pub struct AlwaysDownBorrowRateProvider;

#[async_trait]
impl BorrowRateProvider for AlwaysDownBorrowRateProvider {
    async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Err(ExternalError::Timeout {
            provider: "seclend_api".to_string(),
            elapsed_ms: 5000,
        })
    }
}

/// Drives a real [`CircuitBreaker`] the way `ProviderGateway` does, always
/// failing the underlying call so the breaker's admit/record transitions can
/// be observed from outside through repeated `calculate()` invocations.
pub struct CircuitBreakingBorrowRateProvider {
    circuit: CircuitBreaker,
    calls: AtomicUsize,
}

impl CircuitBreakingBorrowRateProvider {
    pub fn new(circuit: CircuitBreaker) -> Self {
        Self {
            circuit,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn state(&self) -> locate_pricing_engine::external::CircuitState {
        self.circuit.state()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BorrowRateProvider for CircuitBreakingBorrowRateProvider {
    async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        let admission = self.circuit.admit();
        if matches!(admission, Admission::Rejected) {
            return Err(self.circuit.rejection_error());
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.circuit.record_failure();
        Err(ExternalError::ConnectionError {
            provider: "seclend_api".to_string(),
            reason: "refused".to_string(),
        })
    }
}

pub struct FixedMarketSignalProvider {
    pub volatility_index: Decimal,
    pub event_risk_factor: u8,
}

#[async_trait]
impl VolatilityProvider for FixedMarketSignalProvider {
    async fn fetch_volatility(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Ok((
            self.volatility_index,
            DataSource::new("market_volatility_api", SourceType::Api, Utc::now()),
        ))
    }
}

#[async_trait]
impl EventRiskProvider for FixedMarketSignalProvider {
    async fn fetch_event_risk(&self, _ticker: &Symbol) -> Result<(u8, DataSource), ExternalError> {
        Ok((
            self.event_risk_factor,
            DataSource::new("event_calendar_api", SourceType::Api, Utc::now()),
        ))
    }
}

/// No external signal available for volatility or event risk; every call fails
/// so the coordinator's fallback-to-absent path is exercised.
pub struct NoSignalProvider;

#[async_trait]
impl VolatilityProvider for NoSignalProvider {
    async fn fetch_volatility(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Err(ExternalError::ConnectionError {
            provider: "market_volatility_api".to_string(),
            reason: "refused".to_string(),
        })
    }
}

#[async_trait]
impl EventRiskProvider for NoSignalProvider {
    async fn fetch_event_risk(&self, _ticker: &Symbol) -> Result<(u8, DataSource), ExternalError> {
        Err(ExternalError::ConnectionError {
            provider: "event_calendar_api".to_string(),
            reason: "refused".to_string(),
        })
    }
}

/// A fresh single-tier in-memory cache, as every scenario starts with an
/// empty cache rather than sharing state across tests.
pub fn fresh_cache() -> Cache {
    Cache::new(
        Arc::new(SingleCacheStrategy::new(
            Arc::new(InMemoryBackend::new("local")) as Arc<dyn CacheBackend>
        )),
        CacheConfig::default(),
    )
}

pub fn demo_broker(client_id: &str, markup_percentage: Decimal, transaction_amount: Decimal) -> BrokerConfig {
    BrokerConfig {
        client_id: ClientId::parse(client_id).unwrap(),
        markup_percentage,
        transaction_fee_type: TransactionFeeType::Flat,
        transaction_amount,
        active: true,
    }
}

pub type CoordinatorFixture = (
    PricingCoordinator,
    Arc<InMemoryTickerRegistry>,
    Arc<InMemoryBrokerRegistry>,
    Arc<InMemoryAuditSink>,
);

#[allow(clippy::too_many_arguments)]
pub fn build_coordinator(
    borrow_rate_provider: Arc<dyn BorrowRateProvider>,
    volatility_provider: Arc<dyn VolatilityProvider>,
    event_risk_provider: Arc<dyn EventRiskProvider>,
) -> CoordinatorFixture {
    let tickers = Arc::new(InMemoryTickerRegistry::new());
    let brokers = Arc::new(InMemoryBrokerRegistry::new());
    let audit = Arc::new(InMemoryAuditSink::new());
    let coordinator = PricingCoordinator::new(
        tickers.clone(),
        brokers.clone(),
        borrow_rate_provider,
        volatility_provider,
        event_risk_provider,
        fresh_cache(),
        audit.clone(),
        EngineConfig::default(),
    );
    (coordinator, tickers, brokers, audit)
}

/// A coordinator wired with the happy-path fixed-rate borrow provider and no
/// market signal, for scenarios that only care about broker/ticker outcomes.
pub fn coordinator_with_borrow_rate(rate: Decimal) -> CoordinatorFixture {
    build_coordinator(
        Arc::new(FixedBorrowRateProvider(rate)),
        Arc::new(NoSignalProvider),
        Arc::new(NoSignalProvider),
    )
}

pub fn register_aapl(tickers: &InMemoryTickerRegistry, min_borrow_rate: Decimal) {
    tickers.insert(Ticker::new(Symbol::parse("AAPL").unwrap(), min_borrow_rate, "lender-1"));
}

#[allow(dead_code)]
pub fn default_position() -> Decimal {
    dec!(100000)
}
