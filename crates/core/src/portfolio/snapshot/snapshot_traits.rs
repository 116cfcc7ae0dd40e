//! Repository traits for portfolio snapshots.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::PortfolioSnapshot;
use crate::errors::Result;

/// Repository trait for the append-only snapshot table.
#[async_trait]
pub trait SnapshotRepositoryTrait: Send + Sync {
    /// Appends a snapshot.
    async fn append_snapshot(&self, snapshot: &PortfolioSnapshot) -> Result<()>;

    /// Returns a user's snapshots taken at or after `since` (all when `None`),
    /// ordered oldest to newest.
    fn query_snapshots(
        &self,
        user_id: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<PortfolioSnapshot>>;

    /// Returns the most recent snapshot of a user, if any.
    fn get_latest_snapshot(&self, user_id: &str) -> Result<Option<PortfolioSnapshot>>;
}
