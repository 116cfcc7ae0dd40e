use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::PriceSourceTrait;
use crate::errors::{Error, Result};

/// Deterministic in-memory price source.
///
/// Prices can be changed at runtime, which makes it the price source of
/// choice for tests and offline runs.
#[derive(Debug, Default)]
pub struct StaticPriceSource {
    prices: RwLock<HashMap<String, Decimal>>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prices<I, S>(prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: Into<String>,
    {
        let prices = prices
            .into_iter()
            .map(|(symbol, price)| (symbol.into().to_uppercase(), price))
            .collect();
        Self {
            prices: RwLock::new(prices),
        }
    }

    /// Sets or replaces the price of a symbol.
    pub fn set_price(&self, symbol: &str, price: Decimal) {
        if let Ok(mut prices) = self.prices.write() {
            prices.insert(symbol.to_uppercase(), price);
        }
    }

    /// Removes a symbol so subsequent lookups omit it.
    pub fn remove_price(&self, symbol: &str) {
        if let Ok(mut prices) = self.prices.write() {
            prices.remove(&symbol.to_uppercase());
        }
    }
}

#[async_trait]
impl PriceSourceTrait for StaticPriceSource {
    async fn get_prices(&self, symbols: &HashSet<String>) -> Result<HashMap<String, Decimal>> {
        let prices = self
            .prices
            .read()
            .map_err(|e| Error::Unexpected(format!("price table poisoned: {}", e)))?;
        Ok(symbols
            .iter()
            .filter_map(|symbol| prices.get(symbol).map(|price| (symbol.clone(), *price)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_returns_only_known_symbols() {
        let source = StaticPriceSource::with_prices([("btc", dec!(50000)), ("ETH", dec!(3000))]);
        let symbols: HashSet<String> = ["BTC", "SOL"].iter().map(|s| s.to_string()).collect();

        let prices = source.get_prices(&symbols).await.unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices["BTC"], dec!(50000));
    }

    #[tokio::test]
    async fn test_set_and_remove_price() {
        let source = StaticPriceSource::new();
        let symbols: HashSet<String> = ["ETH".to_string()].into_iter().collect();

        source.set_price("eth", dec!(2500));
        assert_eq!(source.get_prices(&symbols).await.unwrap()["ETH"], dec!(2500));

        source.remove_price("ETH");
        assert!(source.get_prices(&symbols).await.unwrap().is_empty());
    }
}
