//! Database model for portfolio snapshots.

use std::collections::BTreeMap;

use diesel::prelude::*;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_decimal, parse_timestamp};
use ledgerfolio_core::constants::DECIMAL_PRECISION;
use ledgerfolio_core::portfolio::snapshot::{AssetPnl, PortfolioSnapshot};

const TABLE: &str = "portfolio_snapshots";

fn persist(value: Decimal) -> String {
    value.round_dp(DECIMAL_PRECISION).normalize().to_string()
}

/// Database model for portfolio snapshots
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::portfolio_snapshots)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PortfolioSnapshotDB {
    pub id: String,
    pub user_id: String,
    pub timestamp: String,
    pub total_value: String,
    pub total_invested: String,
    pub total_pnl: String,
    pub pnl_percentage: String,
    /// JSON object of symbol -> [`AssetPnlDB`]
    pub assets: String,
    pub source: String,
    /// JSON array of symbols
    pub price_fallbacks: String,
}

/// JSON shape of one asset inside `portfolio_snapshots.assets`.
///
/// Decimals are strings so JSON never routes them through `f64`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetPnlDB {
    pub current_value: String,
    pub total_invested: String,
    pub realized_pnl: String,
    pub unrealized_pnl: String,
    pub total_pnl: String,
    pub pnl_percentage: String,
    pub average_buy_price: String,
    pub current_price: String,
    pub quantity: String,
    pub first_purchase_timestamp: String,
    pub last_transaction_timestamp: String,
}

impl From<&AssetPnl> for AssetPnlDB {
    fn from(asset: &AssetPnl) -> Self {
        Self {
            current_value: persist(asset.current_value),
            total_invested: persist(asset.total_invested),
            realized_pnl: persist(asset.realized_pnl),
            unrealized_pnl: persist(asset.unrealized_pnl),
            total_pnl: persist(asset.total_pnl),
            pnl_percentage: persist(asset.pnl_percentage),
            average_buy_price: persist(asset.average_buy_price),
            current_price: persist(asset.current_price),
            quantity: persist(asset.quantity),
            first_purchase_timestamp: format_timestamp(&asset.first_purchase_timestamp),
            last_transaction_timestamp: format_timestamp(&asset.last_transaction_timestamp),
        }
    }
}

impl TryFrom<AssetPnlDB> for AssetPnl {
    type Error = StorageError;

    fn try_from(db: AssetPnlDB) -> Result<Self, Self::Error> {
        Ok(Self {
            current_value: parse_decimal(TABLE, "currentValue", &db.current_value)?,
            total_invested: parse_decimal(TABLE, "totalInvested", &db.total_invested)?,
            realized_pnl: parse_decimal(TABLE, "realizedPnl", &db.realized_pnl)?,
            unrealized_pnl: parse_decimal(TABLE, "unrealizedPnl", &db.unrealized_pnl)?,
            total_pnl: parse_decimal(TABLE, "totalPnl", &db.total_pnl)?,
            pnl_percentage: parse_decimal(TABLE, "pnlPercentage", &db.pnl_percentage)?,
            average_buy_price: parse_decimal(TABLE, "averageBuyPrice", &db.average_buy_price)?,
            current_price: parse_decimal(TABLE, "currentPrice", &db.current_price)?,
            quantity: parse_decimal(TABLE, "quantity", &db.quantity)?,
            first_purchase_timestamp: parse_timestamp(
                TABLE,
                "firstPurchaseTimestamp",
                &db.first_purchase_timestamp,
            )?,
            last_transaction_timestamp: parse_timestamp(
                TABLE,
                "lastTransactionTimestamp",
                &db.last_transaction_timestamp,
            )?,
        })
    }
}

impl TryFrom<&PortfolioSnapshot> for PortfolioSnapshotDB {
    type Error = StorageError;

    fn try_from(domain: &PortfolioSnapshot) -> Result<Self, Self::Error> {
        let assets: BTreeMap<&str, AssetPnlDB> = domain
            .assets
            .iter()
            .map(|(symbol, asset)| (symbol.as_str(), AssetPnlDB::from(asset)))
            .collect();

        Ok(Self {
            id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            timestamp: format_timestamp(&domain.timestamp),
            total_value: persist(domain.total_value),
            total_invested: persist(domain.total_invested),
            total_pnl: persist(domain.total_pnl),
            pnl_percentage: persist(domain.pnl_percentage),
            assets: serde_json::to_string(&assets)?,
            source: domain.source.as_str().to_string(),
            price_fallbacks: serde_json::to_string(&domain.price_fallbacks)?,
        })
    }
}

impl TryFrom<PortfolioSnapshotDB> for PortfolioSnapshot {
    type Error = StorageError;

    fn try_from(db: PortfolioSnapshotDB) -> Result<Self, Self::Error> {
        let raw_assets: BTreeMap<String, AssetPnlDB> = serde_json::from_str(&db.assets)
            .map_err(|e| StorageError::corrupt(TABLE, format!("assets: {}", e)))?;
        let assets = raw_assets
            .into_iter()
            .map(|(symbol, asset)| AssetPnl::try_from(asset).map(|a| (symbol, a)))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(Self {
            timestamp: parse_timestamp(TABLE, "timestamp", &db.timestamp)?,
            total_value: parse_decimal(TABLE, "total_value", &db.total_value)?,
            total_invested: parse_decimal(TABLE, "total_invested", &db.total_invested)?,
            total_pnl: parse_decimal(TABLE, "total_pnl", &db.total_pnl)?,
            pnl_percentage: parse_decimal(TABLE, "pnl_percentage", &db.pnl_percentage)?,
            assets,
            source: db.source.parse().map_err(|e| StorageError::corrupt(TABLE, e))?,
            price_fallbacks: serde_json::from_str(&db.price_fallbacks)
                .map_err(|e| StorageError::corrupt(TABLE, format!("price_fallbacks: {}", e)))?,
            id: db.id,
            user_id: db.user_id,
        })
    }
}
