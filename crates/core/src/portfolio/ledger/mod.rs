//! Ledger module - weighted-average cost basis per (user, asset).

#[allow(clippy::module_inception)]
mod ledger;
mod positions_model;

pub use ledger::*;
pub use positions_model::*;

#[cfg(test)]
mod ledger_tests;
