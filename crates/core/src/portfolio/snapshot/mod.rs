//! Portfolio snapshot module - point-in-time valuation of the ledger.

pub mod snapshot_calculator;
mod snapshot_model;
mod snapshot_traits;

pub use snapshot_calculator::*;
pub use snapshot_model::*;
pub use snapshot_traits::*;
