pub mod benchmark;
pub mod ledger;
pub mod metrics_cache;
pub mod performance;
pub mod risk;
pub mod snapshot;

mod portfolio_service;
mod portfolio_settings;
mod portfolio_traits;


pub use ledger::{AssetPosition, Ledger, OversellPolicy};
pub use metrics_cache::MetricsCache;
pub use portfolio_service::*;
pub use portfolio_settings::*;
pub use portfolio_traits::*;
