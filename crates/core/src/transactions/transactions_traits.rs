use async_trait::async_trait;

use super::transactions_model::Transaction;
use crate::Result;

/// Trait defining the contract for the append-only transaction log.
#[async_trait]
pub trait TransactionRepositoryTrait: Send + Sync {
    /// Appends a transaction. Fails if the id already exists.
    async fn append_transaction(&self, transaction: &Transaction) -> Result<Transaction>;

    /// Returns a user's transactions in the order they were appended,
    /// regardless of their `timestamp`.
    ///
    /// With a `limit`, only the last `limit` appended transactions are
    /// returned (still in append order).
    fn query_transactions(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Transaction>>;

    /// Returns every user id with at least one recorded transaction.
    fn list_user_ids(&self) -> Result<Vec<String>>;
}
