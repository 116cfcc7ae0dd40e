//! Performance analyzer - return, volatility, risk-adjusted ratios and drawdown.

pub mod performance_calculator;
mod performance_model;

pub use performance_calculator::*;
pub use performance_model::*;
