pub mod circuit_breaker;
pub mod client;
pub mod http;
pub mod retry;
pub mod schema;

pub use circuit_breaker::{Admission, CircuitBreaker, CircuitState};
pub use client::{BorrowRateProvider, EventRiskProvider, VolatilityProvider};
pub use http::{HttpBorrowRateClient, HttpEventCalendarClient, HttpVolatilityClient};
