//! Risk analyzer - tail risk, concentration, liquidity and correlation.

mod correlation;
pub mod risk_calculator;
mod risk_model;

pub use correlation::CorrelationMatrix;
pub use risk_calculator::*;
pub use risk_model::*;

#[cfg(test)]
mod risk_calculator_tests;
