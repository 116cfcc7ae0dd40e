use std::collections::HashMap;

use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::*;
use crate::errors::{AnalyticsError, Error};
use crate::portfolio::benchmark::BenchmarkSeries;
use crate::portfolio::ledger::AssetPosition;
use crate::portfolio::snapshot::{build_snapshot, PortfolioSnapshot, SnapshotSource};

fn ts(day: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(day)
}

fn position(symbol: &str, quantity: Decimal, wap: Decimal) -> AssetPosition {
    let mut p = AssetPosition::new("user-1", symbol, ts(0));
    p.quantity = quantity;
    p.weighted_average_price = wap;
    p.total_invested = quantity * wap;
    p
}

fn positions(list: Vec<AssetPosition>) -> HashMap<String, AssetPosition> {
    list.into_iter().map(|p| (p.symbol.clone(), p)).collect()
}

/// One snapshot per day, pricing each position from its price column.
fn priced_history(
    positions: &HashMap<String, AssetPosition>,
    prices: &[(&str, Vec<Decimal>)],
) -> Vec<PortfolioSnapshot> {
    let days = prices.iter().map(|(_, p)| p.len()).max().unwrap_or(0);
    (0..days)
        .map(|day| {
            let day_prices: HashMap<String, Decimal> = prices
                .iter()
                .filter_map(|(symbol, series)| {
                    series.get(day).map(|price| (symbol.to_string(), *price))
                })
                .collect();
            build_snapshot(
                "user-1",
                positions,
                &day_prices,
                ts(day as i64),
                SnapshotSource::Scheduled,
            )
            .unwrap()
        })
        .collect()
}

fn weights(list: &[(&str, Decimal)]) -> Vec<(String, Decimal)> {
    list.iter().map(|(s, w)| (s.to_string(), *w)).collect()
}

fn params<'a>(
    confidence_levels: &'a [Decimal],
    liquidity_scores: &'a HashMap<String, Decimal>,
) -> RiskParameters<'a> {
    RiskParameters {
        confidence_levels,
        liquidity_scores,
        default_liquidity_score: dec!(0.5),
    }
}

fn sample_returns() -> Vec<Decimal> {
    vec![
        dec!(0.03),
        dec!(-0.05),
        dec!(0.01),
        dec!(0.06),
        dec!(-0.01),
        dec!(0.02),
        dec!(-0.03),
        dec!(0.00),
        dec!(0.04),
        dec!(0.05),
    ]
}

#[test]
fn test_historical_var_and_cvar() {
    let returns = sample_returns();

    let at_80 = historical_var(&returns, dec!(0.8)).unwrap();
    assert_eq!(at_80.value_at_risk, dec!(-0.01));
    assert_eq!(at_80.conditional_value_at_risk, dec!(-0.03));

    let at_95 = historical_var(&returns, dec!(0.95)).unwrap();
    assert_eq!(at_95.value_at_risk, dec!(-0.05));
    assert_eq!(at_95.conditional_value_at_risk, dec!(-0.05));
}

#[test]
fn test_var_ordering_across_confidence_levels() {
    let returns = sample_returns();
    let at_95 = historical_var(&returns, dec!(0.95)).unwrap();
    let at_99 = historical_var(&returns, dec!(0.99)).unwrap();
    let at_50 = historical_var(&returns, dec!(0.5)).unwrap();

    assert!(at_99.value_at_risk <= at_95.value_at_risk);
    assert!(at_95.value_at_risk <= at_50.value_at_risk);
    assert!(at_99.conditional_value_at_risk <= at_99.value_at_risk);
}

#[test]
fn test_var_rejects_degenerate_input() {
    assert!(historical_var(&[], dec!(0.95)).is_none());
    assert!(historical_var(&sample_returns(), Decimal::ONE).is_none());
    assert!(historical_var(&sample_returns(), Decimal::ZERO).is_none());
}

#[test]
fn test_herfindahl_and_diversification() {
    let single = weights(&[("BTC", Decimal::ONE)]);
    assert_eq!(herfindahl_index(&single), Decimal::ONE);
    assert_eq!(diversification_ratio(&single), Decimal::ONE);

    let equal = weights(&[
        ("A", dec!(0.25)),
        ("B", dec!(0.25)),
        ("C", dec!(0.25)),
        ("D", dec!(0.25)),
    ]);
    assert_eq!(herfindahl_index(&equal), dec!(0.25));
    assert_eq!(diversification_ratio(&equal), Decimal::ONE);

    let skewed = weights(&[("A", dec!(0.7)), ("B", dec!(0.3))]);
    assert_eq!(herfindahl_index(&skewed), dec!(0.58));
    assert_eq!(diversification_ratio(&skewed).round_dp(8), dec!(0.86206897));

    assert_eq!(herfindahl_index(&[]), Decimal::ZERO);
    assert_eq!(diversification_ratio(&[]), Decimal::ZERO);
}

#[test]
fn test_liquidity_risk_uses_scores_and_default() {
    let scores = HashMap::from([("BTC".to_string(), dec!(0.9)), ("ETH".to_string(), dec!(2))]);
    let levels = [dec!(0.95)];
    let params = params(&levels, &scores);

    // BTC 0.6 * 0.9 + SOL 0.4 * 0.5 (default)
    let risk = liquidity_risk(&weights(&[("BTC", dec!(0.6)), ("SOL", dec!(0.4))]), &params);
    assert_eq!(risk, dec!(0.26));

    // Scores above one are clamped
    let risk = liquidity_risk(&weights(&[("ETH", Decimal::ONE)]), &params);
    assert_eq!(risk, Decimal::ZERO);

    assert_eq!(liquidity_risk(&[], &params), Decimal::ZERO);
}

#[test]
fn test_correlation_risk_weights_known_pairs() {
    let w = weights(&[("A", dec!(0.5)), ("B", dec!(0.3)), ("C", dec!(0.2))]);
    let matrix = CorrelationMatrix::new()
        .with("A", "B", dec!(0.8))
        .with("C", "A", dec!(0.2));

    // (0.15 * 0.8 + 0.10 * 0.2) / (0.15 + 0.10); B-C unknown
    assert_eq!(correlation_risk(&w, &matrix), dec!(0.56));
    assert_eq!(correlation_risk(&w, &CorrelationMatrix::new()), Decimal::ZERO);
}

#[test]
fn test_position_weights_prefer_latest_price() {
    let held = positions(vec![
        position("BTC", dec!(1), dec!(100)),
        position("ETH", dec!(10), dec!(10)),
        position("OLD", Decimal::ZERO, dec!(5)),
        position("SHORT", dec!(-2), dec!(50)),
    ]);
    let history = priced_history(&held, &[("BTC", vec![dec!(300)])]);

    let w = position_weights(&held, history.last());

    // BTC at market 300, ETH at cost 100
    assert_eq!(
        w,
        vec![
            ("BTC".to_string(), dec!(0.75)),
            ("ETH".to_string(), dec!(0.25)),
        ]
    );
    assert_eq!(position_weights(&held, None)[0].1, dec!(0.5));
}

#[test]
fn test_correlation_estimated_from_snapshot_prices() {
    let held = positions(vec![
        position("BTC", dec!(1), dec!(100)),
        position("ETH", dec!(10), dec!(10)),
        position("DOGE", dec!(100), dec!(1)),
    ]);
    let history = priced_history(
        &held,
        &[
            ("BTC", vec![dec!(100), dec!(110), dec!(121), dec!(110)]),
            ("ETH", vec![dec!(10), dec!(11), dec!(12.1), dec!(11)]),
            ("DOGE", vec![dec!(1), dec!(0.9), dec!(0.99), dec!(1.1)]),
        ],
    );

    let matrix = CorrelationMatrix::estimate_from_snapshots(&history);

    assert_eq!(matrix.get("BTC", "ETH").map(|c| c.round_dp(8)), Some(Decimal::ONE));
    assert!(matrix.get("BTC", "DOGE").unwrap() < Decimal::ZERO);
    assert_eq!(matrix.get("ETH", "ETH"), Some(Decimal::ONE));
}

#[test]
fn test_calculate_risk_requires_two_snapshots() {
    let held = positions(vec![position("BTC", dec!(1), dec!(100))]);
    let history = priced_history(&held, &[("BTC", vec![dec!(100)])]);
    let scores = HashMap::new();
    let levels = [dec!(0.95)];

    let result = calculate_risk(
        &history,
        &held,
        &CorrelationMatrix::new(),
        &params(&levels, &scores),
        None,
    );

    assert!(matches!(
        result,
        Err(Error::Analytics(AnalyticsError::InsufficientData { .. }))
    ));
}

#[test]
fn test_calculate_risk_without_positions() {
    let history = priced_history(&HashMap::new(), &[("BTC", vec![dec!(1), dec!(1)])]);
    let scores = HashMap::new();
    let levels = [dec!(0.95)];

    let metrics = calculate_risk(
        &history,
        &HashMap::new(),
        &CorrelationMatrix::new(),
        &params(&levels, &scores),
        None,
    )
    .unwrap();

    assert_eq!(metrics.asset_count, 0);
    assert_eq!(metrics.concentration_risk, Decimal::ZERO);
    assert_eq!(metrics.liquidity_risk, Decimal::ZERO);
    assert_eq!(metrics.correlation_risk, Decimal::ZERO);
    assert_eq!(metrics.diversification_ratio, Decimal::ZERO);
}

#[test]
fn test_calculate_risk_end_to_end() {
    let held = positions(vec![
        position("BTC", dec!(1), dec!(100)),
        position("ETH", dec!(10), dec!(10)),
    ]);
    let history = priced_history(
        &held,
        &[
            ("BTC", vec![dec!(100), dec!(90), dec!(95), dec!(100)]),
            ("ETH", vec![dec!(10), dec!(9), dec!(9.5), dec!(10)]),
        ],
    );
    let scores = HashMap::from([("BTC".to_string(), dec!(0.9))]);
    let levels = [dec!(0.99), dec!(0.95), dec!(0.99)];
    let benchmark = BenchmarkSeries {
        symbol: "SPX".to_string(),
        returns: vec![dec!(-0.1), dec!(0.05), dec!(0.05)],
        total_return: Decimal::ZERO,
    };

    let metrics = calculate_risk(
        &history,
        &held,
        &CorrelationMatrix::estimate_from_snapshots(&history),
        &params(&levels, &scores),
        Some(&benchmark),
    )
    .unwrap();

    assert_eq!(metrics.snapshot_count, 4);
    assert_eq!(metrics.asset_count, 2);
    assert_eq!(metrics.value_at_risk.len(), 2);
    assert_eq!(metrics.value_at_risk[0].confidence, dec!(0.95));
    let var_95 = metrics.var_at(dec!(0.95)).unwrap();
    let var_99 = metrics.var_at(dec!(0.99)).unwrap();
    assert!(var_99.value_at_risk <= var_95.value_at_risk);
    assert_eq!(var_95.value_at_risk, dec!(-0.1));

    assert_eq!(metrics.concentration_risk, dec!(0.5));
    assert_eq!(metrics.liquidity_risk, dec!(0.3));
    assert_eq!(metrics.correlation_risk, Decimal::ONE);
    assert_eq!(metrics.diversification_ratio, Decimal::ONE);
    assert!(metrics.tracking_error > Decimal::ZERO);
    assert_eq!(metrics.benchmark_symbol.as_deref(), Some("SPX"));

    let again = calculate_risk(
        &history,
        &held,
        &CorrelationMatrix::estimate_from_snapshots(&history),
        &params(&levels, &scores),
        Some(&benchmark),
    )
    .unwrap();
    assert_eq!(metrics, again);
}
