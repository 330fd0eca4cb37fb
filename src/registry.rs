//! Reference-data lookups the coordinator depends on but that are themselves
//! database-backed collaborators out of this core's scope. The trait
//! boundary is the contract; production wires it to a real store.

use async_trait::async_trait;

use crate::domain::{BrokerConfig, ClientId, Symbol, Ticker};
use crate::error::ValidationError;

#[async_trait]
pub trait TickerRegistry: Send + Sync {
    async fn get(&self, symbol: &Symbol) -> Option<Ticker>;
}

#[async_trait]
pub trait BrokerRegistry: Send + Sync {
    async fn get(&self, client_id: &ClientId) -> Option<BrokerConfig>;
}

/// Process-local registries backing tests and local development; production
/// deployments back these traits with the database collaborator instead.
pub struct InMemoryTickerRegistry {
    tickers: dashmap::DashMap<Symbol, Ticker>,
}

impl InMemoryTickerRegistry {
    pub fn new() -> Self {
        Self {
            tickers: dashmap::DashMap::new(),
        }
    }

    pub fn insert(&self, ticker: Ticker) {
        self.tickers.insert(ticker.symbol.clone(), ticker);
    }
}

impl Default for InMemoryTickerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TickerRegistry for InMemoryTickerRegistry {
    async fn get(&self, symbol: &Symbol) -> Option<Ticker> {
        self.tickers.get(symbol).map(|entry| entry.value().clone())
    }
}

pub struct InMemoryBrokerRegistry {
    brokers: dashmap::DashMap<ClientId, BrokerConfig>,
}

impl InMemoryBrokerRegistry {
    pub fn new() -> Self {
        Self {
            brokers: dashmap::DashMap::new(),
        }
    }

    /// Rejects a broker whose invariants don't hold rather than registering
    /// one a live calculation would silently trust.
    pub fn insert(&self, broker: BrokerConfig) -> Result<(), ValidationError> {
        broker.validate()?;
        self.brokers.insert(broker.client_id.clone(), broker);
        Ok(())
    }
}

impl Default for InMemoryBrokerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerRegistry for InMemoryBrokerRegistry {
    async fn get(&self, client_id: &ClientId) -> Option<BrokerConfig> {
        self.brokers.get(client_id).map(|entry| entry.value().clone())
    }
}
