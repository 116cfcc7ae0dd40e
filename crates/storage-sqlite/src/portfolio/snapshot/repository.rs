use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::SqliteConnection;
use log::debug;
use std::sync::Arc;

use super::model::PortfolioSnapshotDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::portfolio_snapshots;
use crate::utils::format_timestamp;
use ledgerfolio_core::errors::Result;
use ledgerfolio_core::portfolio::snapshot::{PortfolioSnapshot, SnapshotRepositoryTrait};

pub struct SnapshotRepository {
    pool: Arc<Pool<ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SnapshotRepository {
    pub fn new(pool: Arc<Pool<ConnectionManager<SqliteConnection>>>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    async fn append_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()> {
        let row = PortfolioSnapshotDB::try_from(snapshot)?;
        debug!(
            "Saving snapshot {} for user {} ({} assets)",
            row.id,
            row.user_id,
            snapshot.assets.len()
        );
        self.writer
            .exec(move |conn| {
                diesel::insert_into(portfolio_snapshots::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn query_snapshots(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let mut query = portfolio_snapshots::table
            .into_boxed()
            .filter(portfolio_snapshots::user_id.eq(user_id));
        if let Some(since) = since {
            query = query.filter(portfolio_snapshots::timestamp.ge(format_timestamp(&since)));
        }
        let rows = query
            .order((portfolio_snapshots::timestamp.asc(), portfolio_snapshots::id.asc()))
            .select(PortfolioSnapshotDB::as_select())
            .load::<PortfolioSnapshotDB>(&mut conn)
            .map_err(StorageError::from)?;

        if !rows.is_empty() {
            debug!(
                "Loaded {} snapshots for user {} (since {:?})",
                rows.len(),
                user_id,
                since
            );
        }
        rows.into_iter()
            .map(|row| PortfolioSnapshot::try_from(row).map_err(Into::into))
            .collect()
    }

    fn get_latest_snapshot(&self, user_id: &str) -> Result<Option<PortfolioSnapshot>> {
        let mut conn = get_connection(&self.pool)?;
        let row = portfolio_snapshots::table
            .filter(portfolio_snapshots::user_id.eq(user_id))
            .order((portfolio_snapshots::timestamp.desc(), portfolio_snapshots::id.desc()))
            .select(PortfolioSnapshotDB::as_select())
            .first::<PortfolioSnapshotDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(PortfolioSnapshot::try_from).transpose()?)
    }
}
