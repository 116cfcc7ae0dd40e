use std::collections::{BTreeMap, BTreeSet, HashMap};

use rust_decimal::Decimal;

use crate::portfolio::snapshot::PortfolioSnapshot;
use crate::utils::stats::{pearson_correlation, safe_div};

/// Symmetric pairwise correlation lookup between asset symbols.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrelationMatrix {
    pairs: HashMap<(String, String), Decimal>,
}

fn key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl CorrelationMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, a: &str, b: &str, correlation: Decimal) {
        if a != b {
            self.pairs.insert(key(a, b), correlation);
        }
    }

    pub fn with(mut self, a: &str, b: &str, correlation: Decimal) -> Self {
        self.insert(a, b, correlation);
        self
    }

    /// Correlation of `a` and `b`; an asset is perfectly correlated with itself.
    pub fn get(&self, a: &str, b: &str) -> Option<Decimal> {
        if a == b {
            return Some(Decimal::ONE);
        }
        self.pairs.get(&key(a, b)).copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Estimates correlations from per-asset price moves between consecutive snapshots.
    ///
    /// A period counts for an asset only when both snapshots price it above
    /// zero. Pairs with fewer than two overlapping periods are left out.
    pub fn estimate_from_snapshots(snapshots: &[PortfolioSnapshot]) -> Self {
        let mut returns: BTreeMap<&str, BTreeMap<usize, Decimal>> = BTreeMap::new();

        for (period, pair) in snapshots.windows(2).enumerate() {
            let (previous, current) = (&pair[0], &pair[1]);
            for (symbol, now) in &current.assets {
                let Some(before) = previous.assets.get(symbol) else {
                    continue;
                };
                if before.current_price > Decimal::ZERO && now.current_price > Decimal::ZERO {
                    let change = safe_div(
                        now.current_price - before.current_price,
                        before.current_price,
                    );
                    returns
                        .entry(symbol.as_str())
                        .or_default()
                        .insert(period, change);
                }
            }
        }

        let symbols: Vec<&str> = returns.keys().copied().collect();
        let mut matrix = Self::new();
        for (i, a) in symbols.iter().enumerate() {
            for b in &symbols[i + 1..] {
                let (series_a, series_b) = (&returns[a], &returns[b]);
                let overlap: BTreeSet<usize> = series_a
                    .keys()
                    .filter(|period| series_b.contains_key(period))
                    .copied()
                    .collect();
                let xs: Vec<Decimal> = overlap.iter().map(|p| series_a[p]).collect();
                let ys: Vec<Decimal> = overlap.iter().map(|p| series_b[p]).collect();
                if let Some(correlation) = pearson_correlation(&xs, &ys) {
                    matrix.insert(a, b, correlation);
                }
            }
        }
        matrix
    }
}
