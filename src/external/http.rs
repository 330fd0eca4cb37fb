//! HTTP-backed implementations of the provider traits, each guarded
//! by its own circuit breaker and bounded retry.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::config::{ProviderConfig, RetryConfig};
use crate::domain::{DataSource, SourceMetadata, SourceType, Symbol};
use crate::error::ExternalError;
use crate::external::circuit_breaker::{Admission, CircuitBreaker};
use crate::external::client::{BorrowRateProvider, EventRiskProvider, VolatilityProvider};
use crate::external::retry::with_retry;
use crate::external::schema::{BorrowRateResponse, EventCalendarResponse, VolatilityResponse};

/// Shared machinery for a single upstream provider: HTTP client, retry policy,
/// and circuit breaker. Each concrete `Http*Client` below owns one.
struct ProviderGateway {
    provider_name: String,
    http: Client,
    base_url: String,
    config: ProviderConfig,
    retry: RetryConfig,
    circuit: CircuitBreaker,
}

impl ProviderGateway {
    fn new(
        provider_name: impl Into<String>,
        base_url: impl Into<String>,
        config: ProviderConfig,
        retry: RetryConfig,
        circuit_breaker_config: crate::config::CircuitBreakerConfig,
    ) -> Self {
        let provider_name = provider_name.into();
        Self {
            circuit: CircuitBreaker::new(provider_name.clone(), circuit_breaker_config),
            http: Client::new(),
            base_url: base_url.into(),
            provider_name,
            config,
            retry,
        }
    }

    /// Runs one GET request through the circuit breaker and bounded retry,
    /// parsing the body with `parse` once a response is in hand.
    async fn get<T>(
        &self,
        path: &str,
        parse: impl Fn(&[u8]) -> Result<T, String>,
    ) -> Result<(T, u64, u16), ExternalError> {
        let admission = self.circuit.admit();
        if matches!(admission, Admission::Rejected) {
            return Err(self.circuit.rejection_error());
        }

        let url = format!("{}{}", self.base_url, path);
        let result = with_retry(&self.retry, &self.provider_name, || self.execute_raw(&url)).await;

        match (&admission, &result) {
            (Admission::Probe, Ok(_)) => self.circuit.record_success(),
            (Admission::Probe, Err(_)) => self.circuit.record_failure(),
            (Admission::Allowed, Ok(_)) => self.circuit.record_success(),
            (Admission::Allowed, Err(err)) if err.is_retryable() => self.circuit.record_failure(),
            _ => {}
        }

        let (bytes, response_time_ms, status) = result?;
        let value = parse(&bytes).map_err(|reason| ExternalError::MalformedResponse {
            provider: self.provider_name.clone(),
            reason,
        })?;
        Ok((value, response_time_ms, status))
    }

    async fn execute_raw(&self, url: &str) -> Result<(bytes::Bytes, u64, u16), ExternalError> {
        let started = Instant::now();
        let response = tokio::time::timeout(self.config.timeout, self.http.get(url).send())
            .await
            .map_err(|_| ExternalError::Timeout {
                provider: self.provider_name.clone(),
                elapsed_ms: started.elapsed().as_millis() as u64,
            })?
            .map_err(|err| ExternalError::ConnectionError {
                provider: self.provider_name.clone(),
                reason: err.to_string(),
            })?;

        let status = response.status();
        let response_time_ms = started.elapsed().as_millis() as u64;

        if status.is_client_error() {
            return Err(ExternalError::HttpClientError {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
            });
        }
        if status.is_server_error() {
            return Err(ExternalError::HttpServerError {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
            });
        }
        if status != StatusCode::OK {
            return Err(ExternalError::MalformedResponse {
                provider: self.provider_name.clone(),
                reason: format!("unexpected status {status}"),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ExternalError::MalformedResponse {
                provider: self.provider_name.clone(),
                reason: err.to_string(),
            })?;

        Ok((bytes, response_time_ms, status.as_u16()))
    }

    fn data_source(&self, path: &str, response_time_ms: u64, status_code: u16) -> DataSource {
        DataSource::new(self.provider_name.clone(), SourceType::Api, Utc::now()).with_metadata(
            SourceMetadata::new()
                .with("endpoint", path)
                .with("status_code", status_code)
                .with("response_time_ms", response_time_ms),
        )
    }
}

pub struct HttpBorrowRateClient(Arc<ProviderGateway>);

impl HttpBorrowRateClient {
    pub fn new(
        config: ProviderConfig,
        retry: RetryConfig,
        circuit_breaker_config: crate::config::CircuitBreakerConfig,
    ) -> Self {
        Self(Arc::new(ProviderGateway::new(
            "seclend_api",
            config.base_url.clone(),
            config,
            retry,
            circuit_breaker_config,
        )))
    }
}

#[async_trait]
impl BorrowRateProvider for HttpBorrowRateClient {
    #[instrument(skip(self), fields(provider = "seclend_api"))]
    async fn fetch_borrow_rate(&self, ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        let path = format!("/api/borrows/{}", ticker.0);
        let (body, response_time_ms, status) = self
            .0
            .get(&path, |bytes| {
                serde_json::from_slice::<BorrowRateResponse>(bytes).map_err(|e| e.to_string())
            })
            .await?;
        Ok((body.rate, self.0.data_source(&path, response_time_ms, status)))
    }
}

pub struct HttpVolatilityClient(Arc<ProviderGateway>);

impl HttpVolatilityClient {
    pub fn new(
        config: ProviderConfig,
        retry: RetryConfig,
        circuit_breaker_config: crate::config::CircuitBreakerConfig,
    ) -> Self {
        Self(Arc::new(ProviderGateway::new(
            "market_volatility_api",
            config.base_url.clone(),
            config,
            retry,
            circuit_breaker_config,
        )))
    }
}

#[async_trait]
impl VolatilityProvider for HttpVolatilityClient {
    #[instrument(skip(self), fields(provider = "market_volatility_api"))]
    async fn fetch_volatility(&self, ticker: &Symbol) -> Result<(Decimal, DataSource), ExternalError> {
        let path = format!("/api/market/volatility/{}", ticker.0);
        let (body, response_time_ms, status) = self
            .0
            .get(&path, |bytes| {
                serde_json::from_slice::<VolatilityResponse>(bytes).map_err(|e| e.to_string())
            })
            .await?;
        Ok((
            body.volatility_index,
            self.0.data_source(&path, response_time_ms, status),
        ))
    }
}

pub struct HttpEventCalendarClient(Arc<ProviderGateway>);

impl HttpEventCalendarClient {
    pub fn new(
        config: ProviderConfig,
        retry: RetryConfig,
        circuit_breaker_config: crate::config::CircuitBreakerConfig,
    ) -> Self {
        Self(Arc::new(ProviderGateway::new(
            "event_calendar_api",
            config.base_url.clone(),
            config,
            retry,
            circuit_breaker_config,
        )))
    }
}

#[async_trait]
impl EventRiskProvider for HttpEventCalendarClient {
    #[instrument(skip(self), fields(provider = "event_calendar_api"))]
    async fn fetch_event_risk(&self, ticker: &Symbol) -> Result<(u8, DataSource), ExternalError> {
        let path = format!("/api/events/{}", ticker.0);
        let (body, response_time_ms, status) = self
            .0
            .get(&path, |bytes| {
                serde_json::from_slice::<EventCalendarResponse>(bytes).map_err(|e| e.to_string())
            })
            .await?;
        let risk_factor = body.max_future_risk_factor(Utc::now());
        Ok((risk_factor, self.0.data_source(&path, response_time_ms, status)))
    }
}
