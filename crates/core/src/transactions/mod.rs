//! Transactions module - the append-only log of asset movements.

mod transactions_constants;
mod transactions_model;
mod transactions_traits;


pub use transactions_constants::*;
pub use transactions_model::{NewTransaction, Transaction, TransactionStatus, TransactionType};
pub use transactions_traits::TransactionRepositoryTrait;
