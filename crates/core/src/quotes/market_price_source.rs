use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use rust_decimal::Decimal;

use ledgerfolio_market_data::MarketDataProvider;

use super::PriceSourceTrait;
use crate::Result;

/// Price source backed by a market data provider.
///
/// Asset symbols are mapped to provider symbols as `{SYMBOL}-{QUOTE}`
/// (e.g. `BTC-USD`) unless an explicit override is configured. The quote
/// currency itself is always priced at 1.
pub struct MarketDataPriceSource {
    provider: Arc<dyn MarketDataProvider>,
    quote_currency: String,
    overrides: HashMap<String, String>,
}

impl MarketDataPriceSource {
    pub fn new(provider: Arc<dyn MarketDataProvider>, quote_currency: impl Into<String>) -> Self {
        Self {
            provider,
            quote_currency: quote_currency.into().to_uppercase(),
            overrides: HashMap::new(),
        }
    }

    /// Maps an asset symbol to an explicit provider symbol (e.g. `AAPL` -> `AAPL`).
    pub fn with_override(mut self, symbol: &str, provider_symbol: &str) -> Self {
        self.overrides
            .insert(symbol.to_uppercase(), provider_symbol.to_string());
        self
    }

    pub fn provider_symbol(&self, symbol: &str) -> String {
        self.overrides
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| format!("{}-{}", symbol, self.quote_currency))
    }
}

#[async_trait]
impl PriceSourceTrait for MarketDataPriceSource {
    async fn get_prices(&self, symbols: &HashSet<String>) -> Result<HashMap<String, Decimal>> {
        let mut prices = HashMap::with_capacity(symbols.len());

        if symbols.contains(&self.quote_currency) {
            prices.insert(self.quote_currency.clone(), Decimal::ONE);
        }

        let futures: Vec<_> = symbols
            .iter()
            .filter(|symbol| **symbol != self.quote_currency)
            .map(|symbol| {
                let provider_symbol = self.provider_symbol(symbol);
                async move {
                    let result = self.provider.get_latest_quote(&provider_symbol).await;
                    (symbol.clone(), provider_symbol, result)
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut errors = Vec::new();
        for (symbol, provider_symbol, result) in results {
            match result {
                Ok(quote) if quote.is_usable() => {
                    debug!("Priced {} via {} at {}", symbol, provider_symbol, quote.close);
                    prices.insert(symbol, quote.close);
                }
                Ok(quote) => errors.push((symbol, format!("unusable close {}", quote.close))),
                Err(e) => errors.push((symbol, e.to_string())),
            }
        }

        // Log errors but don't fail the entire operation
        if !errors.is_empty() {
            warn!(
                "Failed to fetch prices for {} symbols via {}: {:?}",
                errors.len(),
                self.provider.id(),
                errors
            );
        }

        Ok(prices)
    }
}
