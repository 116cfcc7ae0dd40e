use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BenchmarkIndexTrait, IndexLevel};
use crate::errors::{AnalyticsError, Error, Result};

/// Deterministic in-memory benchmark index.
#[derive(Debug, Default)]
pub struct StaticBenchmarkIndex {
    series: RwLock<HashMap<String, Vec<IndexLevel>>>,
}

impl StaticBenchmarkIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a benchmark with the given levels.
    pub fn with_levels(self, symbol: &str, levels: Vec<IndexLevel>) -> Self {
        self.set_levels(symbol, levels);
        self
    }

    pub fn set_levels(&self, symbol: &str, mut levels: Vec<IndexLevel>) {
        levels.sort_by_key(|l| l.timestamp);
        if let Ok(mut series) = self.series.write() {
            series.insert(symbol.to_uppercase(), levels);
        }
    }
}

#[async_trait]
impl BenchmarkIndexTrait for StaticBenchmarkIndex {
    fn is_registered(&self, symbol: &str) -> bool {
        self.series
            .read()
            .map(|series| series.contains_key(&symbol.to_uppercase()))
            .unwrap_or(false)
    }

    fn registered_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self
            .series
            .read()
            .map(|series| series.keys().cloned().collect())
            .unwrap_or_default();
        symbols.sort();
        symbols
    }

    async fn get_levels(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<IndexLevel>> {
        let series = self
            .series
            .read()
            .map_err(|e| Error::Unexpected(format!("benchmark table poisoned: {}", e)))?;
        let levels = series
            .get(&symbol.to_uppercase())
            .ok_or_else(|| AnalyticsError::UnknownBenchmark(symbol.to_string()))?;
        Ok(levels
            .iter()
            .filter(|l| l.timestamp >= start && l.timestamp <= end)
            .copied()
            .collect())
    }
}
