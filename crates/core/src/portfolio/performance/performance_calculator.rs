//! Pure performance calculations over an ordered snapshot history.

use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use super::PerformanceMetrics;
use crate::constants::{
    DAYS_PER_YEAR, METRICS_DECIMAL_PRECISION, METRICS_SCHEMA_VERSION, MIN_SNAPSHOTS_FOR_METRICS,
};
use crate::errors::{AnalyticsError, Result};
use crate::portfolio::benchmark::BenchmarkSeries;
use crate::portfolio::snapshot::PortfolioSnapshot;
use crate::utils::stats::{
    max_drawdown, mean, period_returns, safe_div, sample_covariance, sample_std_dev,
    sample_variance, sqrt,
};
use crate::utils::time_utils::fractional_days_between;

/// Fails with `InsufficientData` unless there are enough snapshots for a return series.
pub fn ensure_enough_snapshots(snapshots: &[PortfolioSnapshot]) -> Result<()> {
    if snapshots.len() < MIN_SNAPSHOTS_FOR_METRICS {
        return Err(AnalyticsError::InsufficientData {
            required: MIN_SNAPSHOTS_FOR_METRICS,
            available: snapshots.len(),
        }
        .into());
    }
    Ok(())
}

/// Total portfolio values in snapshot order.
pub fn snapshot_values(snapshots: &[PortfolioSnapshot]) -> Vec<Decimal> {
    snapshots.iter().map(|s| s.total_value).collect()
}

/// `(last - first) / first`, zero when the first value is zero.
pub fn total_return(values: &[Decimal]) -> Decimal {
    match (values.first(), values.last()) {
        (Some(first), Some(last)) => safe_div(*last - *first, *first),
        _ => Decimal::ZERO,
    }
}

/// `(1 + total_return)^(365 / days) - 1`.
///
/// A non-positive span or an overflowing power falls back to the total
/// return; losses of 100% or more annualize to -1.
pub fn annualize_return(total_return: Decimal, period_days: Decimal) -> Decimal {
    if total_return <= dec!(-1) {
        return dec!(-1);
    }
    if period_days <= Decimal::ZERO {
        return total_return;
    }

    let base = Decimal::ONE + total_return;
    let Some(exponent) = Decimal::from(DAYS_PER_YEAR).checked_div(period_days) else {
        return total_return;
    };

    match base.checked_powd(exponent) {
        Some(growth) => growth - Decimal::ONE,
        None => total_return,
    }
}

/// `sqrt(365)`, the factor turning a daily deviation into an annual one.
pub fn annualization_factor() -> Decimal {
    sqrt(Decimal::from(DAYS_PER_YEAR))
}

/// Sensitivity of `returns` to `benchmark_returns`; zero when the benchmark does not move.
pub fn beta(returns: &[Decimal], benchmark_returns: &[Decimal]) -> Decimal {
    let n = returns.len().min(benchmark_returns.len());
    let variance = sample_variance(&benchmark_returns[..n]);
    safe_div(
        sample_covariance(&returns[..n], &benchmark_returns[..n]),
        variance,
    )
}

/// CAPM alpha: `total - (rf + beta * (benchmark_total - rf))`.
pub fn alpha(
    total_return: Decimal,
    risk_free_rate: Decimal,
    beta: Decimal,
    benchmark_total_return: Decimal,
) -> Decimal {
    total_return - (risk_free_rate + beta * (benchmark_total_return - risk_free_rate))
}

/// Per-period portfolio minus benchmark returns.
pub fn excess_returns(returns: &[Decimal], benchmark_returns: &[Decimal]) -> Vec<Decimal> {
    returns
        .iter()
        .zip(benchmark_returns)
        .map(|(r, b)| r - b)
        .collect()
}

/// Mean excess return over its standard deviation.
pub fn information_ratio(returns: &[Decimal], benchmark_returns: &[Decimal]) -> Decimal {
    let excess = excess_returns(returns, benchmark_returns);
    safe_div(mean(&excess), sample_std_dev(&excess))
}

/// Standard deviation of per-period excess returns.
pub fn tracking_error(returns: &[Decimal], benchmark_returns: &[Decimal]) -> Decimal {
    sample_std_dev(&excess_returns(returns, benchmark_returns))
}

/// Annualized downside deviation: RMS of negative daily excess returns times `sqrt(365)`.
fn downside_deviation(returns: &[Decimal], risk_free_rate: Decimal) -> Decimal {
    let daily_risk_free = risk_free_rate / Decimal::from(DAYS_PER_YEAR);
    let downside: Vec<Decimal> = returns
        .iter()
        .map(|r| r - daily_risk_free)
        .filter(|excess| excess.is_sign_negative() && !excess.is_zero())
        .map(|excess| excess * excess)
        .collect();
    if downside.is_empty() {
        return Decimal::ZERO;
    }
    sqrt(mean(&downside)) * annualization_factor()
}

fn win_rate(returns: &[Decimal]) -> Decimal {
    let wins = returns.iter().filter(|r| **r > Decimal::ZERO).count();
    safe_div(Decimal::from(wins), Decimal::from(returns.len()))
}

fn profit_factor(returns: &[Decimal]) -> Option<Decimal> {
    let gains: Decimal = returns.iter().filter(|r| **r > Decimal::ZERO).sum();
    let losses: Decimal = returns.iter().filter(|r| **r < Decimal::ZERO).sum();
    if losses.is_zero() {
        if gains > Decimal::ZERO {
            return None;
        }
        return Some(Decimal::ZERO);
    }
    Some(gains / losses.abs())
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(METRICS_DECIMAL_PRECISION)
}

/// Computes performance metrics for snapshots ordered oldest to newest.
///
/// Without a benchmark, beta is zero, alpha reduces to `total - rf`, and the
/// information ratio is zero.
pub fn calculate_performance(
    snapshots: &[PortfolioSnapshot],
    risk_free_rate: Decimal,
    benchmark: Option<&BenchmarkSeries>,
) -> Result<PerformanceMetrics> {
    ensure_enough_snapshots(snapshots)?;

    let first = &snapshots[0];
    let last = &snapshots[snapshots.len() - 1];

    let values = snapshot_values(snapshots);
    let returns = period_returns(&values);

    let total = total_return(&values);
    let period_days = fractional_days_between(first.timestamp, last.timestamp);
    let annualized = annualize_return(total, period_days);

    let volatility = sample_std_dev(&returns) * annualization_factor();
    let sharpe = safe_div(annualized - risk_free_rate, volatility);
    let sortino = safe_div(
        annualized - risk_free_rate,
        downside_deviation(&returns, risk_free_rate),
    );

    let drawdown = max_drawdown(&values);
    let calmar = safe_div(annualized, drawdown.abs());

    let (portfolio_beta, benchmark_total, information) = match benchmark {
        Some(series) => (
            beta(&returns, &series.returns),
            series.total_return,
            information_ratio(&returns, &series.returns),
        ),
        None => (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO),
    };
    let portfolio_alpha = alpha(total, risk_free_rate, portfolio_beta, benchmark_total);
    let treynor = safe_div(annualized - risk_free_rate, portfolio_beta);

    Ok(PerformanceMetrics {
        schema_version: METRICS_SCHEMA_VERSION,
        start_timestamp: first.timestamp,
        end_timestamp: last.timestamp,
        snapshot_count: snapshots.len(),
        period_days: round(period_days),
        total_return: round(total),
        annualized_return: round(annualized),
        volatility: round(volatility),
        sharpe_ratio: round(sharpe),
        sortino_ratio: round(sortino),
        treynor_ratio: round(treynor),
        calmar_ratio: round(calmar),
        max_drawdown: round(drawdown),
        win_rate: round(win_rate(&returns)),
        profit_factor: profit_factor(&returns).map(round),
        beta: round(portfolio_beta),
        alpha: round(portfolio_alpha),
        information_ratio: round(information),
        risk_free_rate,
        benchmark_symbol: benchmark.map(|b| b.symbol.clone()),
        benchmark_return: benchmark.map(|b| round(b.total_return)),
    })
}
