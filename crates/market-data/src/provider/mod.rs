//! Market data provider abstractions and implementations.
//!
//! This module contains:
//! - The `MarketDataProvider` trait that all providers implement
//! - `RetryingProvider`, a decorator retrying transient failures
//! - Concrete provider implementations (Yahoo)

mod retrying;
mod traits;

pub mod yahoo;

// Re-exports
pub use retrying::{RetryPolicy, RetryingProvider};
pub use traits::MarketDataProvider;
