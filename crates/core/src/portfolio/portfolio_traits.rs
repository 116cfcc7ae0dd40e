use std::collections::HashMap;

use async_trait::async_trait;

use super::benchmark::BenchmarkComparison;
use super::ledger::AssetPosition;
use super::performance::PerformanceMetrics;
use super::risk::RiskMetrics;
use super::snapshot::{PortfolioSnapshot, SnapshotSource};
use crate::errors::Result;
use crate::transactions::{NewTransaction, Transaction};

/// Public contract of the accounting engine.
#[async_trait]
pub trait PortfolioServiceTrait: Send + Sync {
    /// Validates, persists and applies a transaction. Confirmed transactions
    /// are followed by a snapshot of the updated ledger.
    async fn record_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction>;

    /// Stored transactions of a user, in recording order.
    async fn get_transactions(&self, user_id: &str, limit: Option<i64>) -> Result<Vec<Transaction>>;

    /// Live ledger positions of a user, including closed ones, keyed by symbol.
    async fn get_current_positions(&self, user_id: &str) -> Result<HashMap<String, AssetPosition>>;

    /// Values the ledger at current prices and persists the snapshot.
    async fn create_snapshot(
        &self,
        user_id: &str,
        source: SnapshotSource,
    ) -> Result<PortfolioSnapshot>;

    /// Snapshots of the last `days` days, oldest to newest.
    async fn get_portfolio_history(
        &self,
        user_id: &str,
        days: i64,
    ) -> Result<Vec<PortfolioSnapshot>>;

    async fn calculate_performance_metrics(
        &self,
        user_id: &str,
        days: i64,
    ) -> Result<PerformanceMetrics>;

    async fn calculate_risk_metrics(&self, user_id: &str, days: i64) -> Result<RiskMetrics>;

    /// Fails with `UnknownBenchmark` when `benchmark_symbol` is not registered.
    async fn compare_to_benchmark(
        &self,
        user_id: &str,
        benchmark_symbol: &str,
        days: i64,
    ) -> Result<BenchmarkComparison>;

    /// Users with at least one recorded transaction.
    fn list_users(&self) -> Result<Vec<String>>;
}
