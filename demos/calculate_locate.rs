//! Wires the pricing core end-to-end against in-memory registries and stub
//! providers so the calculate-and-audit pipeline can be exercised without a
//! running HTTP server or real upstream providers.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use locate_pricing_engine::cache::{Cache, CacheBackend, InMemoryBackend, SingleCacheStrategy};
use locate_pricing_engine::config::{CacheConfig, EngineConfig};
use locate_pricing_engine::domain::{
    BrokerConfig, CalculationRequestInput, ClientId, DataSource, RequestMetadata, SourceType, Symbol, Ticker,
    TransactionFeeType,
};
use locate_pricing_engine::error::ExternalError;
use locate_pricing_engine::external::{BorrowRateProvider, EventRiskProvider, VolatilityProvider};
use locate_pricing_engine::registry::{BrokerRegistry, InMemoryBrokerRegistry, InMemoryTickerRegistry, TickerRegistry};
use locate_pricing_engine::{audit::InMemoryAuditSink, PricingCoordinator};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct StubBorrowRateProvider(Decimal);

#[async_trait]
impl BorrowRateProvider for StubBorrowRateProvider {
    async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Ok((self.0, DataSource::new("seclend_api", SourceType::Api, Utc::now())))
    }
}

struct StubMarketSignalProvider {
    volatility_index: Decimal,
    event_risk_factor: u8,
}

#[async_trait]
impl VolatilityProvider for StubMarketSignalProvider {
    async fn fetch_volatility(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        Ok((
            self.volatility_index,
            DataSource::new("market_volatility_api", SourceType::Api, Utc::now()),
        ))
    }
}

#[async_trait]
impl EventRiskProvider for StubMarketSignalProvider {
    async fn fetch_event_risk(&self, _ticker: &Symbol) -> Result<(u8, DataSource), ExternalError> {
        Ok((
            self.event_risk_factor,
            DataSource::new("event_calendar_api", SourceType::Api, Utc::now()),
        ))
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let tickers = Arc::new(InMemoryTickerRegistry::new());
    tickers.insert(Ticker::new(Symbol::parse("AAPL")?, dec!(0.02), "lender-1"));

    let brokers = Arc::new(InMemoryBrokerRegistry::new());
    brokers.insert(BrokerConfig {
        client_id: ClientId::parse("broker_demo")?,
        markup_percentage: dec!(5),
        transaction_fee_type: TransactionFeeType::Flat,
        transaction_amount: dec!(25),
        active: true,
    })?;

    let cache = Cache::new(
        Arc::new(SingleCacheStrategy::new(
            Arc::new(InMemoryBackend::new("local")) as Arc<dyn CacheBackend>
        )),
        CacheConfig::default(),
    );

    let coordinator = PricingCoordinator::new(
        tickers,
        brokers,
        Arc::new(StubBorrowRateProvider(dec!(0.05))),
        Arc::new(StubMarketSignalProvider {
            volatility_index: dec!(1.5),
            event_risk_factor: 2,
        }),
        Arc::new(StubMarketSignalProvider {
            volatility_index: dec!(1.5),
            event_risk_factor: 2,
        }),
        cache,
        Arc::new(InMemoryAuditSink::new()),
        EngineConfig::default(),
    );

    let result = coordinator
        .calculate(
            CalculationRequestInput {
                ticker: "AAPL".to_string(),
                position_value: dec!(100000),
                loan_days: 30,
                client_id: "broker_demo".to_string(),
            },
            None,
            RequestMetadata::default(),
        )
        .await
        .context("locate fee calculation failed")?;

    info!(
        total_fee = %result.total_fee,
        borrow_rate_used = %result.borrow_rate_used,
        "calculated locate fee"
    );
    println!("total_fee={} borrow_rate_used={}", result.total_fee, result.borrow_rate_used);

    Ok(())
}
