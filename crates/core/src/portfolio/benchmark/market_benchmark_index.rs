use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use ledgerfolio_market_data::MarketDataProvider;

use super::{BenchmarkIndexTrait, IndexLevel};
use crate::errors::{AnalyticsError, Result};

/// Benchmark symbols registered by default, with their Yahoo symbols.
pub const DEFAULT_BENCHMARKS: [(&str, &str); 4] = [
    ("SPX", "^GSPC"),
    ("NDX", "^NDX"),
    ("DJI", "^DJI"),
    ("BTC", "BTC-USD"),
];

/// Benchmark index backed by a market data provider's daily history.
pub struct MarketDataBenchmarkIndex {
    provider: Arc<dyn MarketDataProvider>,
    symbols: HashMap<String, String>,
}

impl MarketDataBenchmarkIndex {
    /// Creates an index with the [`DEFAULT_BENCHMARKS`] registered.
    pub fn new(provider: Arc<dyn MarketDataProvider>) -> Self {
        let symbols = DEFAULT_BENCHMARKS
            .iter()
            .map(|(symbol, provider_symbol)| (symbol.to_string(), provider_symbol.to_string()))
            .collect();
        Self { provider, symbols }
    }

    /// Registers an extra benchmark under `symbol`.
    pub fn with_benchmark(mut self, symbol: &str, provider_symbol: &str) -> Self {
        self.symbols
            .insert(symbol.to_uppercase(), provider_symbol.to_string());
        self
    }
}

#[async_trait]
impl BenchmarkIndexTrait for MarketDataBenchmarkIndex {
    fn is_registered(&self, symbol: &str) -> bool {
        self.symbols.contains_key(&symbol.to_uppercase())
    }

    fn registered_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.symbols.keys().cloned().collect();
        symbols.sort();
        symbols
    }

    async fn get_levels(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IndexLevel>> {
        let provider_symbol = self
            .symbols
            .get(&symbol.to_uppercase())
            .ok_or_else(|| AnalyticsError::UnknownBenchmark(symbol.to_string()))?;

        debug!(
            "Fetching benchmark {} ({}) levels from {}",
            symbol,
            provider_symbol,
            self.provider.id()
        );

        let quotes = self
            .provider
            .get_historical_quotes(provider_symbol, start, end)
            .await?;

        let mut levels: Vec<IndexLevel> = quotes
            .into_iter()
            .filter(|q| q.is_usable())
            .map(|q| IndexLevel::new(q.timestamp, q.close))
            .collect();
        levels.sort_by_key(|l| l.timestamp);
        Ok(levels)
    }
}
