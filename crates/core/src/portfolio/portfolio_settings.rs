//! Tunables of the accounting engine.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::ledger::OversellPolicy;
use crate::errors::{Result, ValidationError};

/// Engine settings. Every field has a default so partial configs deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioSettings {
    /// Annual risk-free rate as a fraction (0.02 = 2%)
    pub risk_free_rate: Decimal,
    pub oversell_policy: OversellPolicy,
    /// Lifetime of cached metric results; zero disables the cache
    pub metrics_cache_ttl_secs: u64,
    /// Upper bound on a single price source call
    pub price_fetch_timeout_ms: u64,
    pub var_confidence_levels: Vec<Decimal>,
    /// Per-symbol liquidity score in 0..=1
    pub liquidity_scores: HashMap<String, Decimal>,
    pub default_liquidity_score: Decimal,
    /// Benchmark used for beta/alpha in performance metrics and for tracking error
    pub default_benchmark: Option<String>,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        Self {
            risk_free_rate: dec!(0.02),
            oversell_policy: OversellPolicy::default(),
            metrics_cache_ttl_secs: 300,
            price_fetch_timeout_ms: 10_000,
            var_confidence_levels: vec![dec!(0.95), dec!(0.99)],
            liquidity_scores: HashMap::new(),
            default_liquidity_score: dec!(0.5),
            default_benchmark: Some("SPX".to_string()),
        }
    }
}

impl PortfolioSettings {
    pub fn metrics_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.metrics_cache_ttl_secs)
    }

    pub fn price_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.price_fetch_timeout_ms)
    }

    /// Checks value ranges and normalizes symbol keys to upper case.
    pub fn validate(mut self) -> Result<Self> {
        let in_unit_range = |v: &Decimal| *v >= Decimal::ZERO && *v <= Decimal::ONE;

        if self.risk_free_rate < dec!(-1) || self.risk_free_rate > Decimal::ONE {
            return Err(invalid(format!(
                "risk-free rate {} is outside -1..=1",
                self.risk_free_rate
            )));
        }
        if self.price_fetch_timeout_ms == 0 {
            return Err(invalid("price fetch timeout must be positive".to_string()));
        }
        if let Some(level) = self
            .var_confidence_levels
            .iter()
            .find(|c| **c <= Decimal::ZERO || **c >= Decimal::ONE)
        {
            return Err(invalid(format!(
                "VaR confidence level {} is outside 0..1",
                level
            )));
        }
        if !in_unit_range(&self.default_liquidity_score) {
            return Err(invalid(format!(
                "default liquidity score {} is outside 0..=1",
                self.default_liquidity_score
            )));
        }
        if let Some((symbol, score)) = self
            .liquidity_scores
            .iter()
            .find(|(_, score)| !in_unit_range(score))
        {
            return Err(invalid(format!(
                "liquidity score {} for {} is outside 0..=1",
                score, symbol
            )));
        }

        self.liquidity_scores = self
            .liquidity_scores
            .into_iter()
            .map(|(symbol, score)| (symbol.trim().to_uppercase(), score))
            .collect();
        self.default_benchmark = self
            .default_benchmark
            .map(|b| b.trim().to_uppercase())
            .filter(|b| !b.is_empty());
        Ok(self)
    }
}

fn invalid(message: String) -> crate::errors::Error {
    ValidationError::InvalidInput(message).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = PortfolioSettings::default();
        assert_eq!(settings.risk_free_rate, dec!(0.02));
        assert_eq!(settings.oversell_policy, OversellPolicy::Reject);
        assert_eq!(settings.metrics_cache_ttl(), Duration::from_secs(300));
        assert_eq!(settings.price_fetch_timeout(), Duration::from_secs(10));
        assert_eq!(settings.var_confidence_levels, vec![dec!(0.95), dec!(0.99)]);
        assert_eq!(settings.default_benchmark.as_deref(), Some("SPX"));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: PortfolioSettings =
            serde_json::from_str(r#"{"oversellPolicy":"clamp","riskFreeRate":0.03}"#).unwrap();
        assert_eq!(settings.oversell_policy, OversellPolicy::Clamp);
        assert_eq!(settings.risk_free_rate, dec!(0.03));
        assert_eq!(settings.default_liquidity_score, dec!(0.5));
    }

    #[test]
    fn test_validate_rejects_out_of_range_values() {
        let settings = PortfolioSettings {
            var_confidence_levels: vec![dec!(1.5)],
            ..Default::default()
        };
        assert!(settings.validate().is_err());

        let settings = PortfolioSettings {
            liquidity_scores: HashMap::from([("BTC".to_string(), dec!(2))]),
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_normalizes_symbols() {
        let settings = PortfolioSettings {
            liquidity_scores: HashMap::from([(" btc ".to_string(), dec!(0.9))]),
            default_benchmark: Some("ndx".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(settings.liquidity_scores["BTC"], dec!(0.9));
        assert_eq!(settings.default_benchmark.as_deref(), Some("NDX"));
    }
}
