use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::Result;

/// Supplies current prices per asset symbol.
#[async_trait]
pub trait PriceSourceTrait: Send + Sync {
    /// Returns prices for as many of `symbols` as are available.
    ///
    /// Missing symbols are simply absent from the map. An `Err` is treated
    /// by callers as "all symbols omitted" for this call.
    async fn get_prices(&self, symbols: &HashSet<String>) -> Result<HashMap<String, Decimal>>;
}
