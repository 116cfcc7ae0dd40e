use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One observation of a market index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexLevel {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}

impl IndexLevel {
    pub fn new(timestamp: DateTime<Utc>, value: Decimal) -> Self {
        Self { timestamp, value }
    }
}

/// Benchmark return series aligned period-by-period with a snapshot history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkSeries {
    pub symbol: String,
    /// One return per snapshot period (snapshot count - 1 entries)
    pub returns: Vec<Decimal>,
    /// Return from the first to the last aligned level
    pub total_return: Decimal,
}

/// Portfolio-versus-index comparison over a snapshot window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkComparison {
    pub schema_version: u32,
    pub benchmark_symbol: String,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub period_count: usize,
    pub portfolio_return: Decimal,
    pub benchmark_return: Decimal,
    /// Portfolio return minus benchmark return
    pub outperformance: Decimal,
    pub beta: Decimal,
    pub alpha: Decimal,
    pub information_ratio: Decimal,
    pub tracking_error: Decimal,
    /// Mean portfolio return over mean benchmark return in benchmark-up periods
    pub up_capture: Decimal,
    /// Mean portfolio return over mean benchmark return in benchmark-down periods
    pub down_capture: Decimal,
}
