//! Transaction domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transactions_constants::*;
use crate::errors::{LedgerError, Result, ValidationError};

/// Enum representing the supported transaction types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Buy,
    Sell,
    Swap,
    Stake,
    Unstake,
    Yield,
    Fee,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Buy => TRANSACTION_TYPE_BUY,
            TransactionType::Sell => TRANSACTION_TYPE_SELL,
            TransactionType::Swap => TRANSACTION_TYPE_SWAP,
            TransactionType::Stake => TRANSACTION_TYPE_STAKE,
            TransactionType::Unstake => TRANSACTION_TYPE_UNSTAKE,
            TransactionType::Yield => TRANSACTION_TYPE_YIELD,
            TransactionType::Fee => TRANSACTION_TYPE_FEE,
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = LedgerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            TRANSACTION_TYPE_BUY => Ok(TransactionType::Buy),
            TRANSACTION_TYPE_SELL => Ok(TransactionType::Sell),
            TRANSACTION_TYPE_SWAP => Ok(TransactionType::Swap),
            TRANSACTION_TYPE_STAKE => Ok(TransactionType::Stake),
            TRANSACTION_TYPE_UNSTAKE => Ok(TransactionType::Unstake),
            TRANSACTION_TYPE_YIELD => Ok(TransactionType::Yield),
            TRANSACTION_TYPE_FEE => Ok(TransactionType::Fee),
            _ => Err(LedgerError::InvalidTransactionType(s.to_string())),
        }
    }
}

/// Lifecycle status of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Confirmed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => TRANSACTION_STATUS_PENDING,
            TransactionStatus::Confirmed => TRANSACTION_STATUS_CONFIRMED,
            TransactionStatus::Failed => TRANSACTION_STATUS_FAILED,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            TRANSACTION_STATUS_PENDING => Ok(TransactionStatus::Pending),
            TRANSACTION_STATUS_CONFIRMED => Ok(TransactionStatus::Confirmed),
            TRANSACTION_STATUS_FAILED => Ok(TransactionStatus::Failed),
            _ => Err(ValidationError::InvalidInput(format!(
                "Unknown transaction status: {}",
                s
            ))),
        }
    }
}

/// Domain model representing a recorded transaction.
///
/// Field semantics per type:
/// - `buy`: `to_amount` units of `to_token` at `unit_price`, paid `from_amount`
/// - `sell`: `from_amount` units of `from_token` for `to_amount` proceeds
/// - `swap`: `from_amount` of `from_token` for `to_amount` of `to_token`,
///   `unit_price` is the `to_token` price
/// - `yield`: `to_amount` units of `to_token` received, valued at `unit_price`
/// - `fee`: `from_amount` units of `from_token` consumed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    pub user_id: String,
    pub transaction_type: TransactionType,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    pub from_amount: Decimal,
    pub to_amount: Decimal,
    pub unit_price: Decimal,
    pub timestamp: DateTime<Utc>,
    /// External reference such as an on-chain transaction hash
    pub external_reference: Option<String>,
    pub gas_used: Option<Decimal>,
    pub gas_cost: Option<Decimal>,
    pub status: TransactionStatus,
    pub venue: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Only confirmed transactions participate in accounting.
    pub fn is_confirmed(&self) -> bool {
        self.status == TransactionStatus::Confirmed
    }

    /// Symbols whose positions this transaction can touch.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols = Vec::with_capacity(2);
        for token in [&self.from_token, &self.to_token].into_iter().flatten() {
            if !symbols.contains(token) {
                symbols.push(token.clone());
            }
        }
        symbols
    }
}

/// Input model for recording a new transaction
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewTransaction {
    pub id: Option<String>,
    pub user_id: String,
    /// One of `buy`, `sell`, `swap`, `stake`, `unstake`, `yield`, `fee`
    #[serde(alias = "type")]
    pub transaction_type: String,
    pub from_token: Option<String>,
    pub to_token: Option<String>,
    #[serde(default)]
    pub from_amount: Option<Decimal>,
    #[serde(default)]
    pub to_amount: Option<Decimal>,
    #[serde(default)]
    pub unit_price: Option<Decimal>,
    /// Defaults to the recording time
    pub timestamp: Option<DateTime<Utc>>,
    pub external_reference: Option<String>,
    pub gas_used: Option<Decimal>,
    pub gas_cost: Option<Decimal>,
    /// Defaults to `confirmed`
    pub status: Option<String>,
    pub venue: Option<String>,
    pub notes: Option<String>,
}

fn normalize_symbol(token: Option<&String>) -> Option<String> {
    token
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
}

fn normalize_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn invalid(message: impl Into<String>) -> crate::errors::Error {
    LedgerError::InvalidTransaction(message.into()).into()
}

impl NewTransaction {
    /// Validates the input and converts it into a recorded transaction.
    ///
    /// The type is parsed first so an unknown type is always reported as
    /// `InvalidTransactionType`, whatever else is wrong with the input.
    pub fn into_transaction(self, recorded_at: DateTime<Utc>) -> Result<Transaction> {
        let transaction_type = TransactionType::from_str(&self.transaction_type)?;

        let user_id = self.user_id.trim().to_string();
        if user_id.is_empty() {
            return Err(ValidationError::MissingField("userId".to_string()).into());
        }

        let status = match self.status.as_deref() {
            Some(s) => TransactionStatus::from_str(s)?,
            None => TransactionStatus::default(),
        };

        let from_token = normalize_symbol(self.from_token.as_ref());
        let to_token = normalize_symbol(self.to_token.as_ref());
        let from_amount = self.from_amount.unwrap_or(Decimal::ZERO);
        let to_amount = self.to_amount.unwrap_or(Decimal::ZERO);
        let unit_price = self.unit_price.unwrap_or(Decimal::ZERO);

        for (name, value) in [
            ("fromAmount", Some(from_amount)),
            ("toAmount", Some(to_amount)),
            ("unitPrice", Some(unit_price)),
            ("gasUsed", self.gas_used),
            ("gasCost", self.gas_cost),
        ] {
            if value.is_some_and(|v| v.is_sign_negative() && !v.is_zero()) {
                return Err(invalid(format!("{} must not be negative", name)));
            }
        }

        match transaction_type {
            TransactionType::Buy => {
                if to_token.is_none() {
                    return Err(invalid("buy requires toToken"));
                }
                if to_amount.is_zero() {
                    return Err(invalid("buy requires a positive toAmount"));
                }
            }
            TransactionType::Sell | TransactionType::Fee => {
                if from_token.is_none() {
                    return Err(invalid(format!("{} requires fromToken", transaction_type)));
                }
                if from_amount.is_zero() {
                    return Err(invalid(format!(
                        "{} requires a positive fromAmount",
                        transaction_type
                    )));
                }
            }
            TransactionType::Swap => {
                match (&from_token, &to_token) {
                    (Some(from), Some(to)) if from == to => {
                        return Err(invalid("swap requires two different tokens"));
                    }
                    (Some(_), Some(_)) => {}
                    _ => return Err(invalid("swap requires fromToken and toToken")),
                }
                if from_amount.is_zero() || to_amount.is_zero() {
                    return Err(invalid("swap requires positive fromAmount and toAmount"));
                }
            }
            TransactionType::Yield => {
                if to_token.is_none() {
                    return Err(invalid("yield requires toToken"));
                }
                if to_amount.is_zero() {
                    return Err(invalid("yield requires a positive toAmount"));
                }
            }
            TransactionType::Stake | TransactionType::Unstake => {
                if from_token.is_none() && to_token.is_none() {
                    return Err(invalid(format!(
                        "{} requires fromToken or toToken",
                        transaction_type
                    )));
                }
            }
        }

        let id = normalize_text(self.id).unwrap_or_else(|| Uuid::now_v7().to_string());

        Ok(Transaction {
            id,
            user_id,
            transaction_type,
            from_token,
            to_token,
            from_amount,
            to_amount,
            unit_price,
            timestamp: self.timestamp.unwrap_or(recorded_at),
            external_reference: normalize_text(self.external_reference),
            gas_used: self.gas_used,
            gas_cost: self.gas_cost,
            status,
            venue: normalize_text(self.venue),
            notes: normalize_text(self.notes),
            created_at: recorded_at,
        })
    }
}
