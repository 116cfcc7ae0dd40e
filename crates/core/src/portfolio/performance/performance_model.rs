use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Performance statistics derived from a snapshot history.
///
/// Returns and ratios are fractions (0.1 = 10%). Annualized figures use
/// 365 calendar days. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub schema_version: u32,
    pub start_timestamp: DateTime<Utc>,
    pub end_timestamp: DateTime<Utc>,
    pub snapshot_count: usize,
    /// Fractional days between the first and last snapshot
    pub period_days: Decimal,
    pub total_return: Decimal,
    pub annualized_return: Decimal,
    /// Annualized standard deviation of period returns
    pub volatility: Decimal,
    pub sharpe_ratio: Decimal,
    pub sortino_ratio: Decimal,
    pub treynor_ratio: Decimal,
    pub calmar_ratio: Decimal,
    pub max_drawdown: Decimal,
    pub win_rate: Decimal,
    /// Gross gains over gross losses; `None` when there are gains and no losses
    pub profit_factor: Option<Decimal>,
    pub beta: Decimal,
    pub alpha: Decimal,
    pub information_ratio: Decimal,
    pub risk_free_rate: Decimal,
    /// Benchmark used for beta, alpha and information ratio, if any
    pub benchmark_symbol: Option<String>,
    pub benchmark_return: Option<Decimal>,
}
