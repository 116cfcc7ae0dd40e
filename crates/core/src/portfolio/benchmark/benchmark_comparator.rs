//! Pure benchmark comparison over an ordered snapshot history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::{BenchmarkComparison, BenchmarkSeries, IndexLevel};
use crate::constants::{METRICS_DECIMAL_PRECISION, METRICS_SCHEMA_VERSION};
use crate::errors::Result;
use crate::portfolio::performance::{
    alpha, beta, ensure_enough_snapshots, information_ratio, snapshot_values, total_return,
    tracking_error,
};
use crate::portfolio::snapshot::PortfolioSnapshot;
use crate::utils::stats::{mean, period_returns, safe_div};

/// Index value in effect at each timestamp: the latest level at or before it.
///
/// Timestamps earlier than every level use the first level. Returns `None`
/// when there are no levels at all. `levels` must be sorted by timestamp.
pub fn align_levels(timestamps: &[DateTime<Utc>], levels: &[IndexLevel]) -> Option<Vec<Decimal>> {
    if levels.is_empty() {
        return None;
    }
    Some(
        timestamps
            .iter()
            .map(|ts| {
                let idx = levels.partition_point(|l| l.timestamp <= *ts);
                levels[idx.saturating_sub(1)].value
            })
            .collect(),
    )
}

/// Benchmark returns aligned with the periods of `snapshots`.
pub fn benchmark_series(
    symbol: &str,
    snapshots: &[PortfolioSnapshot],
    levels: &[IndexLevel],
) -> Option<BenchmarkSeries> {
    let timestamps: Vec<DateTime<Utc>> = snapshots.iter().map(|s| s.timestamp).collect();
    let aligned = align_levels(&timestamps, levels)?;
    Some(BenchmarkSeries {
        symbol: symbol.to_string(),
        returns: period_returns(&aligned),
        total_return: total_return(&aligned),
    })
}

/// Mean portfolio return over mean benchmark return in the periods selected by `keep`.
fn capture_ratio(
    returns: &[Decimal],
    benchmark_returns: &[Decimal],
    keep: impl Fn(Decimal) -> bool,
) -> Decimal {
    let (portfolio, benchmark): (Vec<Decimal>, Vec<Decimal>) = returns
        .iter()
        .zip(benchmark_returns)
        .filter(|(_, b)| keep(**b))
        .map(|(p, b)| (*p, *b))
        .unzip();
    if benchmark.is_empty() {
        return Decimal::ZERO;
    }
    safe_div(mean(&portfolio), mean(&benchmark))
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(METRICS_DECIMAL_PRECISION)
}

/// Compares a snapshot history (oldest to newest) with an aligned benchmark series.
pub fn compare_to_benchmark(
    snapshots: &[PortfolioSnapshot],
    benchmark: &BenchmarkSeries,
    risk_free_rate: Decimal,
) -> Result<BenchmarkComparison> {
    ensure_enough_snapshots(snapshots)?;

    let values = snapshot_values(snapshots);
    let returns = period_returns(&values);
    let portfolio_return = total_return(&values);

    let portfolio_beta = beta(&returns, &benchmark.returns);
    let portfolio_alpha = alpha(
        portfolio_return,
        risk_free_rate,
        portfolio_beta,
        benchmark.total_return,
    );

    Ok(BenchmarkComparison {
        schema_version: METRICS_SCHEMA_VERSION,
        benchmark_symbol: benchmark.symbol.clone(),
        start_timestamp: snapshots[0].timestamp,
        end_timestamp: snapshots[snapshots.len() - 1].timestamp,
        period_count: returns.len().min(benchmark.returns.len()),
        portfolio_return: round(portfolio_return),
        benchmark_return: round(benchmark.total_return),
        outperformance: round(portfolio_return - benchmark.total_return),
        beta: round(portfolio_beta),
        alpha: round(portfolio_alpha),
        information_ratio: round(information_ratio(&returns, &benchmark.returns)),
        tracking_error: round(tracking_error(&returns, &benchmark.returns)),
        up_capture: round(capture_ratio(&returns, &benchmark.returns, |b| {
            b > Decimal::ZERO
        })),
        down_capture: round(capture_ratio(&returns, &benchmark.returns, |b| {
            b < Decimal::ZERO
        })),
    })
}
