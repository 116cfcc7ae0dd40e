use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::TransactionDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::transactions;
use ledgerfolio_core::errors::Result;
use ledgerfolio_core::transactions::{Transaction, TransactionRepositoryTrait};

/// Append-only transaction log backed by the `transactions` table.
pub struct TransactionRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl TransactionRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn decode(rows: Vec<TransactionDB>) -> Result<Vec<Transaction>> {
        rows.into_iter()
            .map(|row| Transaction::try_from(row).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl TransactionRepositoryTrait for TransactionRepository {
    async fn append_transaction(&self, transaction: &Transaction) -> Result<Transaction> {
        let mut row = TransactionDB::from(transaction);
        let stored = transaction.clone();
        self.writer
            .exec(move |conn| {
                let last = transactions::table
                    .select(diesel::dsl::max(transactions::sequence))
                    .first::<Option<i64>>(conn)
                    .map_err(StorageError::from)?;
                row.sequence = last.unwrap_or(0) + 1;
                diesel::insert_into(transactions::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await?;
        debug!(
            "Appended transaction {} for user {}",
            stored.id, stored.user_id
        );
        Ok(stored)
    }

    fn query_transactions(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Transaction>> {
        let mut conn = get_connection(&self.pool)?;

        let rows = match limit {
            Some(limit) => {
                let mut newest_first = transactions::table
                    .filter(transactions::user_id.eq(user_id))
                    .order(transactions::sequence.desc())
                    .limit(limit.max(0))
                    .select(TransactionDB::as_select())
                    .load::<TransactionDB>(&mut conn)
                    .map_err(StorageError::from)?;
                newest_first.reverse();
                newest_first
            }
            None => transactions::table
                .filter(transactions::user_id.eq(user_id))
                .order(transactions::sequence.asc())
                .select(TransactionDB::as_select())
                .load::<TransactionDB>(&mut conn)
                .map_err(StorageError::from)?,
        };

        Self::decode(rows)
    }

    fn list_user_ids(&self) -> Result<Vec<String>> {
        let mut conn = get_connection(&self.pool)?;
        transactions::table
            .select(transactions::user_id)
            .distinct()
            .order(transactions::user_id.asc())
            .load::<String>(&mut conn)
            .into_core()
    }
}
