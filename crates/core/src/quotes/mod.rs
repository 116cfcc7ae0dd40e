//! Price sources.
//!
//! The ledger never fetches prices itself. Snapshots ask a
//! [`PriceSourceTrait`] for current prices of every held symbol in one
//! batched call:
//!
//! ```text
//! PortfolioService → PriceSourceTrait → MarketDataPriceSource → market-data crate
//!                                    ↘ StaticPriceSource (deterministic)
//! ```
//!
//! Implementations may omit symbols they cannot price; the snapshot
//! builder falls back to the position's weighted-average price for those.

mod market_price_source;
mod quotes_traits;
mod static_price_source;

pub use market_price_source::MarketDataPriceSource;
pub use quotes_traits::PriceSourceTrait;
pub use static_price_source::StaticPriceSource;
