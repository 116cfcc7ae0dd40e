//! Ledgerfolio Market Data Crate
//!
//! This crate provides provider-agnostic market data fetching for the
//! Ledgerfolio accounting core.
//!
//! # Overview
//!
//! - [`MarketDataProvider`] - the trait every quote source implements
//! - [`YahooProvider`] - Yahoo Finance implementation (equities, indices, crypto pairs)
//! - [`RetryingProvider`] - wrapper that retries transient failures with backoff
//! - [`Quote`] - market data quote with OHLCV data
//! - [`MarketDataError`] - error type, classified by [`RetryClass`]
//!
//! # Architecture
//!
//! ```text
//! +------------------+
//! |  Ledgerfolio core |  (price source, benchmark index)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! | RetryingProvider |  (backoff on RateLimited / Timeout)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |    Provider      |  (Yahoo, ...)
//! +------------------+
//!          |
//!          v
//! +------------------+
//! |     Quote        |
//! +------------------+
//! ```

pub mod errors;
pub mod models;
pub mod provider;

pub use errors::{MarketDataError, RetryClass};
pub use models::Quote;
pub use provider::yahoo::YahooProvider;
pub use provider::{MarketDataProvider, RetryPolicy, RetryingProvider};
