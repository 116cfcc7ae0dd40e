//! Pure risk calculations over a snapshot history and the live positions.

use std::collections::HashMap;

use log::warn;
use num_traits::ToPrimitive;
use rust_decimal::Decimal;

use super::{CorrelationMatrix, RiskMetrics, VarEstimate};
use crate::constants::{METRICS_DECIMAL_PRECISION, METRICS_SCHEMA_VERSION};
use crate::errors::Result;
use crate::portfolio::benchmark::BenchmarkSeries;
use crate::portfolio::ledger::AssetPosition;
use crate::portfolio::performance::{ensure_enough_snapshots, snapshot_values, tracking_error};
use crate::portfolio::snapshot::PortfolioSnapshot;
use crate::utils::stats::{mean, period_returns, safe_div};

/// Configuration consumed by [`calculate_risk`].
#[derive(Debug, Clone, Copy)]
pub struct RiskParameters<'a> {
    pub confidence_levels: &'a [Decimal],
    /// Per-symbol liquidity score in 0..=1 (higher is more liquid)
    pub liquidity_scores: &'a HashMap<String, Decimal>,
    pub default_liquidity_score: Decimal,
}

/// Historical VaR and CVaR of `returns` at `confidence`.
///
/// Returns sorted ascending; VaR is the return at index
/// `floor((1 - confidence) * n)`, CVaR the mean of all returns at or below it.
pub fn historical_var(returns: &[Decimal], confidence: Decimal) -> Option<VarEstimate> {
    if returns.is_empty() || confidence <= Decimal::ZERO || confidence >= Decimal::ONE {
        return None;
    }

    let mut sorted = returns.to_vec();
    sorted.sort();

    let n = sorted.len();
    let index = ((Decimal::ONE - confidence) * Decimal::from(n))
        .floor()
        .to_usize()
        .unwrap_or(0)
        .min(n - 1);
    let value_at_risk = sorted[index];

    let tail: Vec<Decimal> = sorted
        .iter()
        .copied()
        .take_while(|r| *r <= value_at_risk)
        .collect();

    Some(VarEstimate {
        confidence,
        value_at_risk,
        conditional_value_at_risk: mean(&tail),
    })
}

/// Value fractions of held positions, sorted by symbol.
///
/// Positions are valued at the latest snapshot price for the symbol, or at
/// their weighted-average price when the snapshot has none. Short and
/// closed positions carry no weight.
pub fn position_weights(
    positions: &HashMap<String, AssetPosition>,
    latest: Option<&PortfolioSnapshot>,
) -> Vec<(String, Decimal)> {
    let mut values: Vec<(String, Decimal)> = positions
        .values()
        .filter(|p| p.is_open() && p.quantity > Decimal::ZERO)
        .map(|p| {
            let price = latest
                .and_then(|s| s.assets.get(&p.symbol))
                .map(|a| a.current_price)
                .filter(|price| *price > Decimal::ZERO)
                .unwrap_or(p.weighted_average_price);
            (p.symbol.clone(), p.quantity * price)
        })
        .filter(|(_, value)| *value > Decimal::ZERO)
        .collect();
    values.sort_by(|a, b| a.0.cmp(&b.0));

    let total: Decimal = values.iter().map(|(_, v)| *v).sum();
    values
        .into_iter()
        .map(|(symbol, value)| (symbol, safe_div(value, total)))
        .collect()
}

/// Herfindahl index: sum of squared weights.
pub fn herfindahl_index(weights: &[(String, Decimal)]) -> Decimal {
    weights.iter().map(|(_, w)| w * w).sum()
}

/// `1 - sum(weight * liquidity score)`.
pub fn liquidity_risk(weights: &[(String, Decimal)], params: &RiskParameters<'_>) -> Decimal {
    if weights.is_empty() {
        return Decimal::ZERO;
    }
    let weighted: Decimal = weights
        .iter()
        .map(|(symbol, w)| {
            let score = params
                .liquidity_scores
                .get(symbol)
                .copied()
                .unwrap_or(params.default_liquidity_score)
                .clamp(Decimal::ZERO, Decimal::ONE);
            w * score
        })
        .sum();
    Decimal::ONE - weighted
}

/// Mean pairwise correlation weighted by `w_i * w_j`, over pairs with a known correlation.
pub fn correlation_risk(
    weights: &[(String, Decimal)],
    correlations: &CorrelationMatrix,
) -> Decimal {
    let mut weighted_sum = Decimal::ZERO;
    let mut weight_total = Decimal::ZERO;
    for (i, (a, wa)) in weights.iter().enumerate() {
        for (b, wb) in &weights[i + 1..] {
            if let Some(correlation) = correlations.get(a, b) {
                let pair_weight = wa * wb;
                weighted_sum += pair_weight * correlation;
                weight_total += pair_weight;
            }
        }
    }
    safe_div(weighted_sum, weight_total)
}

/// Effective number of assets (`1 / HHI`) over the actual number of assets.
pub fn diversification_ratio(weights: &[(String, Decimal)]) -> Decimal {
    if weights.is_empty() {
        return Decimal::ZERO;
    }
    let effective_n = safe_div(Decimal::ONE, herfindahl_index(weights));
    safe_div(effective_n, Decimal::from(weights.len()))
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(METRICS_DECIMAL_PRECISION)
}

/// Computes risk metrics for snapshots ordered oldest to newest.
pub fn calculate_risk(
    snapshots: &[PortfolioSnapshot],
    positions: &HashMap<String, AssetPosition>,
    correlations: &CorrelationMatrix,
    params: &RiskParameters<'_>,
    benchmark: Option<&BenchmarkSeries>,
) -> Result<RiskMetrics> {
    ensure_enough_snapshots(snapshots)?;

    let returns = period_returns(&snapshot_values(snapshots));

    let mut confidence_levels = params.confidence_levels.to_vec();
    confidence_levels.sort();
    confidence_levels.dedup();
    let value_at_risk: Vec<VarEstimate> = confidence_levels
        .iter()
        .filter_map(|confidence| {
            let estimate = historical_var(&returns, *confidence);
            if estimate.is_none() {
                warn!("Ignoring invalid VaR confidence level {}", confidence);
            }
            estimate
        })
        .map(|estimate| VarEstimate {
            confidence: estimate.confidence,
            value_at_risk: round(estimate.value_at_risk),
            conditional_value_at_risk: round(estimate.conditional_value_at_risk),
        })
        .collect();

    let weights = position_weights(positions, snapshots.last());

    Ok(RiskMetrics {
        schema_version: METRICS_SCHEMA_VERSION,
        start_timestamp: snapshots[0].timestamp,
        end_timestamp: snapshots[snapshots.len() - 1].timestamp,
        snapshot_count: snapshots.len(),
        value_at_risk,
        concentration_risk: round(herfindahl_index(&weights)),
        liquidity_risk: round(liquidity_risk(&weights, params)),
        correlation_risk: round(correlation_risk(&weights, correlations)),
        diversification_ratio: round(diversification_ratio(&weights)),
        tracking_error: round(
            benchmark
                .map(|b| tracking_error(&returns, &b.returns))
                .unwrap_or(Decimal::ZERO),
        ),
        asset_count: weights.len(),
        benchmark_symbol: benchmark.map(|b| b.symbol.clone()),
    })
}
