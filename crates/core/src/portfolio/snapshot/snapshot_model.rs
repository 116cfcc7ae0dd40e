//! Portfolio snapshot domain models.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ValidationError;

/// Source of a snapshot - what triggered its creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Taken right after a confirmed transaction was applied
    #[default]
    Transaction,
    /// Requested explicitly by a caller
    OnDemand,
    /// Taken by the periodic scheduler
    Scheduled,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Transaction => "transaction",
            SnapshotSource::OnDemand => "on_demand",
            SnapshotSource::Scheduled => "scheduled",
        }
    }
}

impl fmt::Display for SnapshotSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapshotSource {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(SnapshotSource::Transaction),
            "on_demand" => Ok(SnapshotSource::OnDemand),
            "scheduled" => Ok(SnapshotSource::Scheduled),
            other => Err(ValidationError::InvalidInput(format!(
                "Unknown snapshot source: {}",
                other
            ))),
        }
    }
}

/// Profit-and-loss view of one asset inside a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetPnl {
    pub current_value: Decimal,
    pub total_invested: Decimal,
    pub realized_pnl: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_pnl: Decimal,
    /// Total P&L as a percentage of total invested (0 when nothing was invested)
    pub pnl_percentage: Decimal,
    pub average_buy_price: Decimal,
    pub current_price: Decimal,
    pub quantity: Decimal,
    pub first_purchase_timestamp: DateTime<Utc>,
    pub last_transaction_timestamp: DateTime<Utc>,
}

/// Immutable point-in-time capture of a user's portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSnapshot {
    pub id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_value: Decimal,
    pub total_invested: Decimal,
    pub total_pnl: Decimal,
    pub pnl_percentage: Decimal,
    /// Per-asset breakdown keyed by symbol
    pub assets: BTreeMap<String, AssetPnl>,
    pub source: SnapshotSource,
    /// Symbols valued at their weighted-average price because no price was available
    #[serde(default)]
    pub price_fallbacks: Vec<String>,
}

impl PortfolioSnapshot {
    pub fn has_price_fallbacks(&self) -> bool {
        !self.price_fallbacks.is_empty()
    }
}
