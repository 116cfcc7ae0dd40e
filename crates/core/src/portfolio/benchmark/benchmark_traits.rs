use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::IndexLevel;
use crate::errors::Result;

/// Registry and history source for benchmark indices.
#[async_trait]
pub trait BenchmarkIndexTrait: Send + Sync {
    /// Whether `symbol` names a known benchmark.
    fn is_registered(&self, symbol: &str) -> bool;

    /// All registered benchmark symbols, sorted.
    fn registered_symbols(&self) -> Vec<String>;

    /// Index levels between `start` and `end` (inclusive), oldest first.
    ///
    /// Fails with `UnknownBenchmark` for unregistered symbols.
    async fn get_levels(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IndexLevel>>;
}
