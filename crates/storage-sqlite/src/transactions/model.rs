//! Database model for recorded transactions.

use diesel::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::utils::{format_timestamp, parse_decimal, parse_optional_decimal, parse_timestamp};
use ledgerfolio_core::transactions::Transaction;

const TABLE: &str = "transactions";

/// Database model for transactions
#[derive(
    Queryable, Identifiable, Insertable, Selectable, PartialEq, Serialize, Deserialize, Debug, Clone,
)]
#[diesel(table_name = crate::schema::transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TransactionDB {
    pub id: String,
    pub user_id: String,
    pub transaction_type: String,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub from_amount: String,
    pub to_amount: String,
    pub unit_price: String,
    pub timestamp: String,
    pub external_reference: Option<String>,
    pub gas_used: Option<String>,
    pub gas_cost: Option<String>,
    pub status: String,
    pub venue: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    /// Position in the log, assigned by the writer on append.
    pub sequence: i64,
}

// Amounts are stored exactly as recorded so a replay reproduces the live ledger.
impl From<&Transaction> for TransactionDB {
    fn from(domain: &Transaction) -> Self {
        Self {
            id: domain.id.clone(),
            user_id: domain.user_id.clone(),
            transaction_type: domain.transaction_type.as_str().to_string(),
            from_token: domain.from_token.clone(),
            to_token: domain.to_token.clone(),
            from_amount: domain.from_amount.to_string(),
            to_amount: domain.to_amount.to_string(),
            unit_price: domain.unit_price.to_string(),
            timestamp: format_timestamp(&domain.timestamp),
            external_reference: domain.external_reference.clone(),
            gas_used: domain.gas_used.map(|v| v.to_string()),
            gas_cost: domain.gas_cost.map(|v| v.to_string()),
            status: domain.status.as_str().to_string(),
            venue: domain.venue.clone(),
            notes: domain.notes.clone(),
            created_at: format_timestamp(&domain.created_at),
            sequence: 0,
        }
    }
}

impl TryFrom<TransactionDB> for Transaction {
    type Error = StorageError;

    fn try_from(db: TransactionDB) -> Result<Self, Self::Error> {
        Ok(Self {
            transaction_type: db
                .transaction_type
                .parse()
                .map_err(|e| StorageError::corrupt(TABLE, e))?,
            status: db.status.parse().map_err(|e| StorageError::corrupt(TABLE, e))?,
            from_amount: parse_decimal(TABLE, "from_amount", &db.from_amount)?,
            to_amount: parse_decimal(TABLE, "to_amount", &db.to_amount)?,
            unit_price: parse_decimal(TABLE, "unit_price", &db.unit_price)?,
            timestamp: parse_timestamp(TABLE, "timestamp", &db.timestamp)?,
            gas_used: parse_optional_decimal(TABLE, "gas_used", db.gas_used.as_deref())?,
            gas_cost: parse_optional_decimal(TABLE, "gas_cost", db.gas_cost.as_deref())?,
            created_at: parse_timestamp(TABLE, "created_at", &db.created_at)?,
            id: db.id,
            user_id: db.user_id,
            from_token: db.from_token,
            to_token: db.to_token,
            external_reference: db.external_reference,
            venue: db.venue,
            notes: db.notes,
        })
    }
}
