//! Borrow rate and locate fee calculation core.
//!
//! Computes the total fee a broker charges a client to locate and borrow
//! shares for a short sale: rate adjustment, time proration, broker markup,
//! and transaction fee, each resolved through a cache/provider/fallback chain
//! with circuit-breaker-guarded external calls, and recorded to an immutable
//! audit trail.
//!
//! [`coordinator::PricingCoordinator`] is the entry point; it wires together
//! [`registry`] lookups, [`external`] providers, [`cache`], [`engine`], and
//! [`audit`] into the calculate-and-audit pipeline.

pub mod audit;
pub mod cache;
pub mod config;
pub mod coordinator;
pub mod domain;
pub mod engine;
pub mod error;
pub mod external;
pub mod math;
pub mod registry;

mod macros;

pub use coordinator::PricingCoordinator;
pub use error::{PricingError, PricingResult};
