//! Decimal statistics shared by the analyzers.
//!
//! All helpers are total: degenerate inputs (too few observations, zero
//! variance, zero denominators) yield zero or `None` rather than panicking.

use rust_decimal::{Decimal, MathematicalOps};

/// Division that returns zero for a zero denominator.
pub fn safe_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator.checked_div(denominator).unwrap_or(Decimal::ZERO)
    }
}

/// Square root, zero for negative input.
pub fn sqrt(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        return Decimal::ZERO;
    }
    value.sqrt().unwrap_or(Decimal::ZERO)
}

pub fn mean(values: &[Decimal]) -> Decimal {
    if values.is_empty() {
        return Decimal::ZERO;
    }
    let sum: Decimal = values.iter().sum();
    sum / Decimal::from(values.len())
}

/// Sample variance (n - 1 denominator). Zero with fewer than two observations.
pub fn sample_variance(values: &[Decimal]) -> Decimal {
    if values.len() < 2 {
        return Decimal::ZERO;
    }
    let avg = mean(values);
    let sum_squared_diff: Decimal = values
        .iter()
        .map(|&v| {
            let diff = v - avg;
            diff * diff
        })
        .sum();
    let variance = sum_squared_diff / Decimal::from(values.len() - 1);
    variance.max(Decimal::ZERO)
}

/// Sample standard deviation.
pub fn sample_std_dev(values: &[Decimal]) -> Decimal {
    sqrt(sample_variance(values))
}

/// Sample covariance over the common prefix of both series.
pub fn sample_covariance(a: &[Decimal], b: &[Decimal]) -> Decimal {
    let n = a.len().min(b.len());
    if n < 2 {
        return Decimal::ZERO;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let (mean_a, mean_b) = (mean(a), mean(b));
    let sum: Decimal = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| (x - mean_a) * (y - mean_b))
        .sum();
    sum / Decimal::from(n - 1)
}

/// Pearson correlation, `None` when undefined (fewer than two points or zero variance).
pub fn pearson_correlation(a: &[Decimal], b: &[Decimal]) -> Option<Decimal> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let (a, b) = (&a[..n], &b[..n]);
    let denominator = sample_std_dev(a) * sample_std_dev(b);
    if denominator.is_zero() {
        return None;
    }
    let correlation = sample_covariance(a, b) / denominator;
    Some(correlation.clamp(Decimal::NEGATIVE_ONE, Decimal::ONE))
}

/// Simple period returns `(v[i] - v[i-1]) / v[i-1]`; a zero previous value yields 0.
pub fn period_returns(values: &[Decimal]) -> Vec<Decimal> {
    values
        .windows(2)
        .map(|pair| safe_div(pair[1] - pair[0], pair[0]))
        .collect()
}

/// Compounded total return of a return series.
pub fn compound(returns: &[Decimal]) -> Decimal {
    returns
        .iter()
        .fold(Decimal::ONE, |acc, r| {
            acc.checked_mul(Decimal::ONE + r).unwrap_or(acc)
        })
        - Decimal::ONE
}

/// Largest peak-to-trough decline of a value series, as a fraction of the peak.
pub fn max_drawdown(values: &[Decimal]) -> Decimal {
    let mut peak: Option<Decimal> = None;
    let mut max_drawdown = Decimal::ZERO;

    for &value in values {
        let current_peak = match peak {
            Some(p) if p >= value => p,
            _ => {
                peak = Some(value);
                value
            }
        };
        if current_peak > Decimal::ZERO {
            let drawdown = (current_peak - value) / current_peak;
            max_drawdown = max_drawdown.max(drawdown);
        }
    }

    max_drawdown
}
