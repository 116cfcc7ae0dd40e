//! Pure snapshot construction from ledger positions and current prices.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

use super::{AssetPnl, PortfolioSnapshot, SnapshotSource};
use crate::errors::{AnalyticsError, Error, Result};
use crate::portfolio::ledger::AssetPosition;
use crate::utils::stats::safe_div;

/// Symbols that need a market price: every position still holding units.
pub fn symbols_to_price(positions: &HashMap<String, AssetPosition>) -> HashSet<String> {
    positions
        .values()
        .filter(|p| p.is_open())
        .map(|p| p.symbol.clone())
        .collect()
}

fn percentage(pnl: Decimal, invested: Decimal) -> Decimal {
    safe_div(pnl, invested).saturating_mul(dec!(100))
}

/// Values one position. Closed positions and positions without a usable
/// price are valued at their weighted-average price, so their unrealized
/// P&L is zero. A price whose market value overflows is not usable.
/// Returns the view and whether a fallback price was used.
pub fn value_position(
    position: &AssetPosition,
    price: Option<Decimal>,
) -> Result<(AssetPnl, bool)> {
    let market = price
        .filter(|p| *p > Decimal::ZERO && position.is_open())
        .and_then(|p| position.quantity.checked_mul(p).map(|value| (p, value)));
    let fallback = position.is_open() && market.is_none();

    let out_of_range = || {
        Error::from(AnalyticsError::ValueOutOfRange(format!(
            "valuation of {} for user {}",
            position.symbol, position.user_id
        )))
    };
    let (current_price, current_value) = match market {
        Some(priced) => priced,
        None => (
            position.weighted_average_price,
            position.cost_basis().ok_or_else(out_of_range)?,
        ),
    };
    let cost_basis = position.cost_basis().ok_or_else(out_of_range)?;
    let unrealized_pnl = current_value.checked_sub(cost_basis).ok_or_else(out_of_range)?;
    let total_pnl = position
        .total_realized_pnl
        .checked_add(unrealized_pnl)
        .ok_or_else(out_of_range)?;

    let view = AssetPnl {
        current_value,
        total_invested: position.total_invested,
        realized_pnl: position.total_realized_pnl,
        unrealized_pnl,
        total_pnl,
        pnl_percentage: percentage(total_pnl, position.total_invested),
        average_buy_price: position.weighted_average_price,
        current_price,
        quantity: position.quantity,
        first_purchase_timestamp: position.first_acquisition_timestamp,
        last_transaction_timestamp: position.last_activity_timestamp,
    };
    Ok((view, fallback))
}

fn checked_total(total: Decimal, value: Decimal, what: &str) -> Result<Decimal> {
    total.checked_add(value).ok_or_else(|| {
        AnalyticsError::ValueOutOfRange(format!("snapshot {} does not fit", what)).into()
    })
}

/// Builds a snapshot of every ledger position at `timestamp`.
///
/// Does not fail on missing prices: affected symbols are listed in
/// `price_fallbacks` instead. Fails only when totals are out of range.
pub fn build_snapshot(
    user_id: &str,
    positions: &HashMap<String, AssetPosition>,
    prices: &HashMap<String, Decimal>,
    timestamp: DateTime<Utc>,
    source: SnapshotSource,
) -> Result<PortfolioSnapshot> {
    let mut assets = BTreeMap::new();
    let mut price_fallbacks = Vec::new();
    let mut total_value = Decimal::ZERO;
    let mut total_invested = Decimal::ZERO;
    let mut total_pnl = Decimal::ZERO;

    for (symbol, position) in positions {
        let (view, fallback) = value_position(position, prices.get(symbol).copied())?;
        if fallback {
            price_fallbacks.push(symbol.clone());
        }
        total_value = checked_total(total_value, view.current_value, "value")?;
        total_invested = checked_total(total_invested, view.total_invested, "invested")?;
        total_pnl = checked_total(total_pnl, view.total_pnl, "P&L")?;
        assets.insert(symbol.clone(), view);
    }
    price_fallbacks.sort();

    Ok(PortfolioSnapshot {
        id: Uuid::now_v7().to_string(),
        user_id: user_id.to_string(),
        timestamp,
        total_value,
        total_invested,
        total_pnl,
        pnl_percentage: percentage(total_pnl, total_invested),
        assets,
        source,
        price_fallbacks,
    })
}
