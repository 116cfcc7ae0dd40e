//! Ledgerfolio Core - Domain entities, services, and traits.
//!
//! This crate turns a stream of asset transactions into cost-basis
//! positions, point-in-time portfolio snapshots, and performance/risk
//! analytics. It is database-agnostic and defines traits that are
//! implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod events;
pub mod portfolio;
pub mod quotes;
pub mod transactions;
pub mod utils;

// Re-export common types from the portfolio and transaction modules
pub use portfolio::*;
pub use transactions::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
