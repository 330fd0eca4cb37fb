//! PricingCoordinator: the cross-cutting orchestration that ties the
//! engine, the external-data layer, the cache, and the audit sink together.
//!
//! Pipeline: validate -> resolve broker config (cache -> database) -> resolve
//! base rate, volatility, and event risk concurrently (each: cache -> provider
//! -> fallback) -> compute -> audit -> respond. A single external failure
//! never fails the overall calculation; it is substituted with a flagged
//! fallback value. The coordinator only fails on invalid input, an unknown
//! ticker, an unknown/inactive broker, or total borrow-rate unavailability.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Semaphore;
use tracing::{instrument, warn};

use serde::{Deserialize, Serialize};

use crate::audit::AuditSink;
use crate::cache::{keys, Cache};
use crate::config::EngineConfig;
use crate::domain::{
    CalculationRequest, CalculationRequestInput, CalculationResult, CorrelationId, DataSource, RateContext,
    RequestMetadata, SourceType, Ticker,
};
use crate::engine::CalculationEngine;
use crate::error::{ExternalError, NotFoundError, PricingError, PricingResult};
use crate::external::{BorrowRateProvider, EventRiskProvider, VolatilityProvider};
use crate::registry::{BrokerRegistry, TickerRegistry};

/// What `calculation:<TICKER>:<CLIENT>:<POSITION>:<DAYS>` stores: the
/// finished result plus the provenance it was computed from, so a cache hit
/// can still produce a faithful audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedCalculation {
    result: CalculationResult,
    data_sources: Vec<DataSource>,
}

pub struct PricingCoordinator {
    tickers: Arc<dyn TickerRegistry>,
    brokers: Arc<dyn BrokerRegistry>,
    borrow_rate_provider: Arc<dyn BorrowRateProvider>,
    volatility_provider: Arc<dyn VolatilityProvider>,
    event_risk_provider: Arc<dyn EventRiskProvider>,
    cache: Cache,
    audit: Arc<dyn AuditSink>,
    config: EngineConfig,
    concurrency: Semaphore,
}

impl PricingCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tickers: Arc<dyn TickerRegistry>,
        brokers: Arc<dyn BrokerRegistry>,
        borrow_rate_provider: Arc<dyn BorrowRateProvider>,
        volatility_provider: Arc<dyn VolatilityProvider>,
        event_risk_provider: Arc<dyn EventRiskProvider>,
        cache: Cache,
        audit: Arc<dyn AuditSink>,
        config: EngineConfig,
    ) -> Self {
        let concurrency = Semaphore::new(config.max_concurrent_calculations);
        Self {
            tickers,
            brokers,
            borrow_rate_provider,
            volatility_provider,
            event_risk_provider,
            cache,
            audit,
            config,
            concurrency,
        }
    }

    #[instrument(skip(self, input, metadata), fields(ticker = %input.ticker, client_id = %input.client_id))]
    pub async fn calculate(
        &self,
        input: CalculationRequestInput,
        correlation_id: Option<CorrelationId>,
        metadata: RequestMetadata,
    ) -> PricingResult<CalculationResult> {
        let request = CalculationRequest::validate(input, correlation_id)?;

        let _permit = self.concurrency.try_acquire().map_err(|_| PricingError::Busy {
            correlation_id: request.correlation_id.0.clone(),
        })?;

        let calculation_key = keys::calculation_key(
            &request.ticker.0,
            &request.client_id,
            &request.position_value.to_string(),
            request.loan_days,
        );

        if let Some(cached) = self.cache.get::<CachedCalculation>(&calculation_key).await {
            return self.audit_and_return(&request, cached.result, cached.data_sources, metadata).await;
        }

        let ticker = self
            .tickers
            .get(&request.ticker)
            .await
            .ok_or_else(|| NotFoundError::Ticker(request.ticker.0.clone()))?;

        let (broker, (base_rate, base_rate_source), (volatility_index, volatility_source), (event_risk_factor, event_risk_source)) =
            tokio::time::timeout(self.config.request_deadline, async {
                tokio::join!(
                    self.resolve_broker(&request),
                    self.resolve_borrow_rate(&ticker),
                    self.resolve_volatility(&ticker),
                    self.resolve_event_risk(&ticker),
                )
            })
            .await
            .map_err(|_| PricingError::Internal {
                correlation_id: request.correlation_id.0.clone(),
                message: "request deadline elapsed during external resolution".to_string(),
            })?;

        let broker = broker?;

        let rate_context = RateContext {
            base_rate,
            base_rate_source,
            volatility_index,
            volatility_source,
            event_risk_factor,
            event_risk_source,
        };

        let result = CalculationEngine::compute(
            &ticker,
            &broker,
            request.position_value,
            request.loan_days,
            &rate_context,
        )?;

        let data_sources: Vec<DataSource> = rate_context
            .data_sources()
            .into_iter()
            .map(|(_, source)| source.clone())
            .collect();

        self.cache
            .set(
                &calculation_key,
                &CachedCalculation {
                    result: result.clone(),
                    data_sources: data_sources.clone(),
                },
                "engine",
                None,
            )
            .await;

        self.audit_and_return(&request, result, data_sources, metadata).await
    }

    /// Writes the audit record for a (possibly cache-served) result and hands
    /// the result back to the caller.
    async fn audit_and_return(
        &self,
        request: &CalculationRequest,
        result: CalculationResult,
        data_sources: Vec<DataSource>,
        metadata: RequestMetadata,
    ) -> PricingResult<CalculationResult> {
        let audit_record = crate::domain::AuditRecord::new(request, &result, data_sources, metadata, Utc::now());
        let status = self.audit.append(audit_record).await;
        if matches!(status, crate::audit::AuditStatus::Failed) {
            warn!(correlation_id = %request.correlation_id, "audit record failed to persist; result still returned");
        }
        Ok(result)
    }

    async fn resolve_broker(&self, request: &CalculationRequest) -> PricingResult<crate::domain::BrokerConfig> {
        let key = keys::broker_config_key(&request.client_id);
        if let Some(broker) = self.cache.get::<crate::domain::BrokerConfig>(&key).await {
            return Self::check_broker_active(broker);
        }

        let broker = self
            .brokers
            .get(&request.client_id)
            .await
            .ok_or_else(|| NotFoundError::Client(request.client_id.0.clone()))?;
        self.cache.set(&key, &broker, "broker_registry", None).await;
        Self::check_broker_active(broker)
    }

    fn check_broker_active(broker: crate::domain::BrokerConfig) -> PricingResult<crate::domain::BrokerConfig> {
        if !broker.active {
            return Err(NotFoundError::ClientInactive(broker.client_id.0.clone()).into());
        }
        Ok(broker)
    }

    /// Borrow rate: cache (fresh) -> provider -> cache (stale, within the widened
    /// window) -> `max(ticker.min_borrow_rate, global_minimum_borrow_rate)`.
    async fn resolve_borrow_rate(&self, ticker: &Ticker) -> (Decimal, DataSource) {
        let key = keys::borrow_rate_key(&ticker.symbol.0);
        let now = Utc::now();

        if let Some(rate) = self.cache.get::<Decimal>(&key).await {
            return (rate, DataSource::new("cache", SourceType::Cache, now));
        }

        match self.borrow_rate_provider.fetch_borrow_rate(&ticker.symbol).await {
            Ok((rate, source)) => {
                self.cache.set(&key, &rate, source.source_name.clone(), None).await;
                (rate, source)
            }
            Err(err) => {
                warn!(ticker = %ticker.symbol, %err, "borrow rate provider unavailable, falling back");
                if let Some((payload, source_name)) = self.cache.get_stale(&key).await
                    && let Ok(rate) = serde_json::from_value::<Decimal>(payload)
                {
                    return (
                        rate,
                        DataSource::fallback(source_name, "stale cached borrow rate used after provider failure", now),
                    );
                }
                let floor = ticker.min_borrow_rate.max(self.config.global_minimum_borrow_rate);
                (
                    floor,
                    DataSource::fallback(
                        "ticker_min_borrow_rate",
                        "no fresh or stale cached rate and provider unavailable",
                        now,
                    ),
                )
            }
        }
    }

    /// Volatility: cache (fresh) -> provider -> last cached value (any age) -> absent.
    async fn resolve_volatility(&self, ticker: &Ticker) -> (Option<Decimal>, Option<DataSource>) {
        let key = keys::volatility_key(&ticker.symbol.0);
        let now = Utc::now();

        if let Some(index) = self.cache.get::<Decimal>(&key).await {
            return (Some(index), Some(DataSource::new("cache", SourceType::Cache, now)));
        }

        match self.volatility_provider.fetch_volatility(&ticker.symbol).await {
            Ok((index, source)) => {
                self.cache.set(&key, &index, source.source_name.clone(), None).await;
                (Some(index), Some(source))
            }
            Err(err) => {
                warn!(ticker = %ticker.symbol, %err, "volatility provider unavailable, falling back");
                if let Some((payload, source_name)) = self.cache.get_stale(&key).await
                    && let Ok(index) = serde_json::from_value::<Decimal>(payload)
                {
                    return (
                        Some(index),
                        Some(DataSource::fallback(source_name, "last cached volatility used after provider failure", now)),
                    );
                }
                (None, None)
            }
        }
    }

    /// Event risk: cache (fresh) -> provider -> last cached value (any age) -> absent.
    async fn resolve_event_risk(&self, ticker: &Ticker) -> (Option<u8>, Option<DataSource>) {
        let key = keys::event_risk_key(&ticker.symbol.0);
        let now = Utc::now();

        if let Some(factor) = self.cache.get::<u8>(&key).await {
            return (Some(factor), Some(DataSource::new("cache", SourceType::Cache, now)));
        }

        match self.event_risk_provider.fetch_event_risk(&ticker.symbol).await {
            Ok((factor, source)) => {
                self.cache.set(&key, &factor, source.source_name.clone(), None).await;
                (Some(factor), Some(source))
            }
            Err(err) => {
                warn!(ticker = %ticker.symbol, %err, "event risk provider unavailable, falling back");
                if let Some((payload, source_name)) = self.cache.get_stale(&key).await
                    && let Ok(factor) = serde_json::from_value::<u8>(payload)
                {
                    return (
                        Some(factor),
                        Some(DataSource::fallback(source_name, "last cached event risk used after provider failure", now)),
                    );
                }
                (None, None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::InMemoryAuditSink;
    use crate::cache::{CacheBackend, InMemoryBackend, SingleCacheStrategy};
    use crate::config::CacheConfig;
    use crate::domain::{BrokerConfig, Symbol, TransactionFeeType};
    use crate::registry::{InMemoryBrokerRegistry, InMemoryTickerRegistry};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;

    struct FixedBorrowRateProvider(Decimal);
    #[async_trait]
    impl BorrowRateProvider for FixedBorrowRateProvider {
        async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
            Ok((self.0, DataSource::new("seclend_api", SourceType::Api, Utc::now())))
        }
    }

    struct AlwaysDownBorrowRateProvider;
    #[async_trait]
    impl BorrowRateProvider for AlwaysDownBorrowRateProvider {
        async fn fetch_borrow_rate(&self, ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
            Err(ExternalError::Timeout {
                provider: "seclend_api".to_string(),
                elapsed_ms: 5000,
            })
            .map_err(|e: ExternalError| {
                let _ = ticker;
                e
            })
        }
    }

    struct CountingBorrowRateProvider {
        rate: Decimal,
        calls: std::sync::atomic::AtomicUsize,
    }
    #[async_trait]
    impl BorrowRateProvider for CountingBorrowRateProvider {
        async fn fetch_borrow_rate(&self, _ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
            self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok((self.rate, DataSource::new("seclend_api", SourceType::Api, Utc::now())))
        }
    }

    struct NoSignalProvider;
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

    fn coordinator(
        borrow_rate_provider: Arc<dyn BorrowRateProvider>,
    ) -> (PricingCoordinator, Arc<InMemoryTickerRegistry>, Arc<InMemoryBrokerRegistry>) {
        let tickers = Arc::new(InMemoryTickerRegistry::new());
        let brokers = Arc::new(InMemoryBrokerRegistry::new());
        let cache = Cache::new(
            Arc::new(SingleCacheStrategy::new(Arc::new(InMemoryBackend::new("local")) as Arc<dyn CacheBackend>)),
            CacheConfig::default(),
        );
        let coordinator = PricingCoordinator::new(
            tickers.clone(),
            brokers.clone(),
            borrow_rate_provider,
            Arc::new(NoSignalProvider),
            Arc::new(NoSignalProvider),
            cache,
            Arc::new(InMemoryAuditSink::new()),
            EngineConfig::default(),
        );
        (coordinator, tickers, brokers)
    }

    #[tokio::test]
    async fn happy_path_computes_and_audits() {
        let (coordinator, tickers, brokers) = coordinator(Arc::new(FixedBorrowRateProvider(dec!(0.05))));
        tickers.insert(Ticker::new(Symbol::parse("AAPL").unwrap(), dec!(0.01), "lender-1"));
        brokers.insert(BrokerConfig {
            client_id: crate::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: true,
        }).unwrap();

        let result = coordinator
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
            .unwrap();

        assert_eq!(result.breakdown.borrow_cost, dec!(123.29));
        assert_eq!(result.breakdown.total(), result.total_fee);
    }

    #[tokio::test]
    async fn unknown_ticker_is_rejected() {
        let (coordinator, _tickers, brokers) = coordinator(Arc::new(FixedBorrowRateProvider(dec!(0.05))));
        brokers.insert(BrokerConfig {
            client_id: crate::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: true,
        }).unwrap();

        let err = coordinator
            .calculate(
                CalculationRequestInput {
                    ticker: "ZZZZZ".into(),
                    position_value: dec!(1000),
                    loan_days: 10,
                    client_id: "client_123".into(),
                },
                None,
                RequestMetadata::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "TICKER_NOT_FOUND");
    }

    #[tokio::test]
    async fn inactive_broker_is_rejected_with_dedicated_error() {
        let (coordinator, tickers, brokers) = coordinator(Arc::new(FixedBorrowRateProvider(dec!(0.05))));
        tickers.insert(Ticker::new(Symbol::parse("AAPL").unwrap(), dec!(0.01), "lender-1"));
        brokers.insert(BrokerConfig {
            client_id: crate::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: false,
        }).unwrap();

        let err = coordinator
            .calculate(
                CalculationRequestInput {
                    ticker: "AAPL".into(),
                    position_value: dec!(1000),
                    loan_days: 10,
                    client_id: "client_123".into(),
                },
                None,
                RequestMetadata::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "CLIENT_INACTIVE");
    }

    #[tokio::test]
    async fn borrow_rate_provider_down_falls_back_to_ticker_minimum() {
        let (coordinator, tickers, brokers) = coordinator(Arc::new(AlwaysDownBorrowRateProvider));
        tickers.insert(Ticker::new(Symbol::parse("AAPL").unwrap(), dec!(0.02), "lender-1"));
        brokers.insert(BrokerConfig {
            client_id: crate::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: true,
        }).unwrap();

        let result = coordinator
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
            .unwrap();

        assert_eq!(result.borrow_rate_used, dec!(0.0200));
    }

    #[tokio::test]
    async fn identical_request_is_served_from_calculation_cache() {
        let provider = Arc::new(CountingBorrowRateProvider {
            rate: dec!(0.05),
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let (coordinator, tickers, brokers) = coordinator(provider.clone());
        tickers.insert(Ticker::new(Symbol::parse("AAPL").unwrap(), dec!(0.01), "lender-1"));
        brokers.insert(BrokerConfig {
            client_id: crate::domain::ClientId::parse("client_123").unwrap(),
            markup_percentage: dec!(5),
            transaction_fee_type: TransactionFeeType::Flat,
            transaction_amount: dec!(25),
            active: true,
        }).unwrap();

        let request = || CalculationRequestInput {
            ticker: "AAPL".into(),
            position_value: dec!(100000),
            loan_days: 30,
            client_id: "client_123".into(),
        };

        let first = coordinator
            .calculate(request(), None, RequestMetadata::default())
            .await
            .unwrap();
        let second = coordinator
            .calculate(request(), None, RequestMetadata::default())
            .await
            .unwrap();

        assert_eq!(first.total_fee, second.total_fee);
        assert_eq!(
            provider.calls.load(std::sync::atomic::Ordering::SeqCst),
            1,
            "second identical request should be served from the calculation cache, not re-fetched"
        );
    }
}
