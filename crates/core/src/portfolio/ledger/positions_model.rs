use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::QUANTITY_THRESHOLD;

/// True when the quantity is large enough to count as a holding.
pub fn is_quantity_significant(quantity: &Decimal) -> bool {
    let threshold =
        Decimal::from_str_radix(QUANTITY_THRESHOLD, 10).unwrap_or_else(|_| Decimal::new(1, 8));
    quantity.abs() >= threshold
}

/// Cost-basis state of one asset for one user.
///
/// Owned by the [`Ledger`](super::Ledger). Each transaction produces a fresh
/// value that replaces the previous one; positions are never deleted and
/// remain as realized-P&L records once the quantity reaches zero.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetPosition {
    pub user_id: String,
    pub symbol: String,
    /// Units held. Only negative under the `allow_short` oversell policy.
    pub quantity: Decimal,
    pub weighted_average_price: Decimal,
    /// Cumulative cost basis ever contributed (not reduced by sells).
    pub total_invested: Decimal,
    pub total_realized_pnl: Decimal,
    pub first_acquisition_timestamp: DateTime<Utc>,
    pub last_activity_timestamp: DateTime<Utc>,
}

impl AssetPosition {
    pub fn new(user_id: &str, symbol: &str, timestamp: DateTime<Utc>) -> Self {
        AssetPosition {
            user_id: user_id.to_string(),
            symbol: symbol.to_string(),
            quantity: Decimal::ZERO,
            weighted_average_price: Decimal::ZERO,
            total_invested: Decimal::ZERO,
            total_realized_pnl: Decimal::ZERO,
            first_acquisition_timestamp: timestamp,
            last_activity_timestamp: timestamp,
        }
    }

    /// Whether the position currently holds (or owes) units.
    pub fn is_open(&self) -> bool {
        is_quantity_significant(&self.quantity)
    }

    /// Cost basis of the units currently held, `None` if it overflows.
    pub fn cost_basis(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.weighted_average_price)
    }

    pub(crate) fn touch(&mut self, timestamp: DateTime<Utc>) {
        if timestamp > self.last_activity_timestamp {
            self.last_activity_timestamp = timestamp;
        }
    }

    /// Snaps dust quantities to zero.
    pub(crate) fn normalize_quantity(&mut self) {
        if !is_quantity_significant(&self.quantity) {
            self.quantity = Decimal::ZERO;
        }
    }
}
