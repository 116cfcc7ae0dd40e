//! Portfolio service: the per-user serialized entry point to the engine.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use log::{debug, error, warn};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::benchmark::{
    self, benchmark_series, BenchmarkComparison, BenchmarkIndexTrait, BenchmarkSeries,
};
use super::ledger::{AssetPosition, Ledger};
use super::metrics_cache::MetricsCache;
use super::performance::{calculate_performance, ensure_enough_snapshots, PerformanceMetrics};
use super::portfolio_settings::PortfolioSettings;
use super::portfolio_traits::PortfolioServiceTrait;
use super::risk::{calculate_risk, CorrelationMatrix, RiskMetrics, RiskParameters};
use super::snapshot::{
    build_snapshot, symbols_to_price, PortfolioSnapshot, SnapshotRepositoryTrait, SnapshotSource,
};
use crate::errors::{AnalyticsError, Error, Result, ValidationError};
use crate::events::{DomainEvent, DomainEventSink};
use crate::quotes::PriceSourceTrait;
use crate::transactions::{NewTransaction, Transaction, TransactionRepositoryTrait};
use crate::utils::time_utils::window_start;

/// Extra history requested before the first snapshot so the first snapshot
/// has an index level at or before it across weekends and holidays.
const BENCHMARK_LOOKBACK_DAYS: i64 = 7;

/// Lazily replayed ledger of one user, guarded by that user's write lock.
type LedgerSlot = Arc<Mutex<Option<Ledger>>>;

pub struct PortfolioService {
    transaction_repository: Arc<dyn TransactionRepositoryTrait>,
    snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
    price_source: Arc<dyn PriceSourceTrait>,
    benchmark_index: Arc<dyn BenchmarkIndexTrait>,
    event_sink: Arc<dyn DomainEventSink>,
    settings: PortfolioSettings,
    ledgers: DashMap<String, LedgerSlot>,
    metrics_cache: MetricsCache,
}

impl PortfolioService {
    pub fn new(
        transaction_repository: Arc<dyn TransactionRepositoryTrait>,
        snapshot_repository: Arc<dyn SnapshotRepositoryTrait>,
        price_source: Arc<dyn PriceSourceTrait>,
        benchmark_index: Arc<dyn BenchmarkIndexTrait>,
        event_sink: Arc<dyn DomainEventSink>,
        settings: PortfolioSettings,
    ) -> Self {
        let metrics_cache = MetricsCache::new(settings.metrics_cache_ttl());
        Self {
            transaction_repository,
            snapshot_repository,
            price_source,
            benchmark_index,
            event_sink,
            settings,
            ledgers: DashMap::new(),
            metrics_cache,
        }
    }

    pub fn settings(&self) -> &PortfolioSettings {
        &self.settings
    }

    fn ledger_slot(&self, user_id: &str) -> LedgerSlot {
        self.ledgers
            .entry(user_id.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Replays the user's transaction log into `slot` on first access.
    fn ensure_ledger<'a>(
        &self,
        user_id: &str,
        slot: &'a mut Option<Ledger>,
    ) -> Result<&'a mut Ledger> {
        if slot.is_none() {
            let transactions = self.transaction_repository.query_transactions(user_id, None)?;
            *slot = Some(Ledger::replay(
                user_id,
                self.settings.oversell_policy,
                &transactions,
            ));
        }
        slot.as_mut()
            .ok_or_else(|| Error::Unexpected(format!("ledger for user {} not loaded", user_id)))
    }

    /// Current prices for `symbols`. Errors and timeouts yield an empty map
    /// so the snapshot falls back to cost prices.
    async fn fetch_prices(&self, symbols: &HashSet<String>) -> HashMap<String, Decimal> {
        if symbols.is_empty() {
            return HashMap::new();
        }
        match tokio::time::timeout(
            self.settings.price_fetch_timeout(),
            self.price_source.get_prices(symbols),
        )
        .await
        {
            Ok(Ok(prices)) => prices,
            Ok(Err(e)) => {
                warn!("Price source failed for {} symbols: {}", symbols.len(), e);
                HashMap::new()
            }
            Err(_) => {
                warn!(
                    "Price source timed out after {:?} for {} symbols",
                    self.settings.price_fetch_timeout(),
                    symbols.len()
                );
                HashMap::new()
            }
        }
    }

    /// Builds and persists a snapshot. The caller holds the user's write lock.
    async fn snapshot_ledger(
        &self,
        ledger: &Ledger,
        source: SnapshotSource,
    ) -> Result<PortfolioSnapshot> {
        let user_id = ledger.user_id();
        let prices = self.fetch_prices(&symbols_to_price(ledger.positions())).await;
        let snapshot = build_snapshot(user_id, ledger.positions(), &prices, Utc::now(), source)?;

        if snapshot.has_price_fallbacks() {
            warn!(
                "Snapshot {} for user {} valued at cost for: {}",
                snapshot.id,
                user_id,
                snapshot.price_fallbacks.join(", ")
            );
        }

        self.snapshot_repository
            .append_snapshot(&snapshot)
            .await
            .map_err(|e| {
                error!("Failed to persist snapshot for user {}: {}", user_id, e);
                e
            })?;
        self.metrics_cache.invalidate_user(user_id);

        let mut events = vec![DomainEvent::snapshot_created(
            user_id.to_string(),
            snapshot.id.clone(),
            snapshot.source,
            snapshot.timestamp,
        )];
        if snapshot.has_price_fallbacks() {
            events.push(DomainEvent::price_fallback_used(
                user_id.to_string(),
                snapshot.id.clone(),
                snapshot.price_fallbacks.clone(),
            ));
        }
        self.event_sink.emit_batch(events);

        debug!(
            "Created {} snapshot {} for user {} (value {})",
            snapshot.source, snapshot.id, user_id, snapshot.total_value
        );
        Ok(snapshot)
    }

    fn history(&self, user_id: &str, days: i64) -> Result<Vec<PortfolioSnapshot>> {
        if days <= 0 {
            return Err(ValidationError::InvalidInput(format!(
                "days must be positive, got {}",
                days
            ))
            .into());
        }
        let since = window_start(Utc::now(), days);
        let mut snapshots = self.snapshot_repository.query_snapshots(user_id, Some(since))?;
        snapshots.sort_by_key(|s| s.timestamp);
        Ok(snapshots)
    }

    /// Benchmark returns aligned with `snapshots`; `None` when the index has no levels.
    async fn load_benchmark_series(
        &self,
        symbol: &str,
        snapshots: &[PortfolioSnapshot],
    ) -> Result<Option<BenchmarkSeries>> {
        let (Some(first), Some(last)) = (snapshots.first(), snapshots.last()) else {
            return Ok(None);
        };
        let start = first
            .timestamp
            .checked_sub_signed(Duration::days(BENCHMARK_LOOKBACK_DAYS))
            .unwrap_or(first.timestamp);
        let levels = self
            .benchmark_index
            .get_levels(symbol, start, last.timestamp)
            .await?;
        Ok(benchmark_series(symbol, snapshots, &levels))
    }

    /// Series of the configured default benchmark. Failures degrade to no benchmark.
    async fn default_benchmark_series(
        &self,
        snapshots: &[PortfolioSnapshot],
    ) -> Option<BenchmarkSeries> {
        let symbol = self.settings.default_benchmark.as_deref()?;
        if !self.benchmark_index.is_registered(symbol) {
            debug!("Default benchmark {} is not registered", symbol);
            return None;
        }
        match self.load_benchmark_series(symbol, snapshots).await {
            Ok(Some(series)) => Some(series),
            Ok(None) => {
                warn!("No levels for benchmark {} in the requested window", symbol);
                None
            }
            Err(e) => {
                warn!("Failed to load benchmark {}: {}", symbol, e);
                None
            }
        }
    }

    fn risk_parameters(&self) -> RiskParameters<'_> {
        RiskParameters {
            confidence_levels: &self.settings.var_confidence_levels,
            liquidity_scores: &self.settings.liquidity_scores,
            default_liquidity_score: self.settings.default_liquidity_score,
        }
    }
}

#[async_trait]
impl PortfolioServiceTrait for PortfolioService {
    async fn record_transaction(&self, new_transaction: NewTransaction) -> Result<Transaction> {
        let transaction = new_transaction.into_transaction(Utc::now())?;
        let user_id = transaction.user_id.clone();

        let slot = self.ledger_slot(&user_id);
        let mut guard = slot.lock().await;
        let ledger = self.ensure_ledger(&user_id, &mut guard)?;

        let update = ledger.stage(&transaction)?;
        let stored = self
            .transaction_repository
            .append_transaction(&transaction)
            .await
            .map_err(|e| {
                error!(
                    "Failed to persist transaction {} for user {}: {}",
                    transaction.id, user_id, e
                );
                e
            })?;

        let symbols = update.symbols();
        ledger.commit(update);
        self.metrics_cache.invalidate_user(&user_id);
        self.event_sink.emit(DomainEvent::transaction_recorded(
            user_id.clone(),
            stored.id.clone(),
            symbols,
        ));

        if !stored.is_confirmed() {
            debug!(
                "Recorded {} transaction {} without ledger effect",
                stored.status, stored.id
            );
            return Ok(stored);
        }

        self.snapshot_ledger(ledger, SnapshotSource::Transaction).await?;
        Ok(stored)
    }

    async fn get_transactions(
        &self,
        user_id: &str,
        limit: Option<i64>,
    ) -> Result<Vec<Transaction>> {
        if limit.is_some_and(|l| l <= 0) {
            return Err(ValidationError::InvalidInput("limit must be positive".to_string()).into());
        }
        self.transaction_repository.query_transactions(user_id, limit)
    }

    async fn get_current_positions(
        &self,
        user_id: &str,
    ) -> Result<HashMap<String, AssetPosition>> {
        let slot = self.ledger_slot(user_id);
        let mut guard = slot.lock().await;
        let ledger = self.ensure_ledger(user_id, &mut guard)?;
        Ok(ledger.positions().clone())
    }

    async fn create_snapshot(
        &self,
        user_id: &str,
        source: SnapshotSource,
    ) -> Result<PortfolioSnapshot> {
        let slot = self.ledger_slot(user_id);
        let mut guard = slot.lock().await;
        let ledger = self.ensure_ledger(user_id, &mut guard)?;
        self.snapshot_ledger(ledger, source).await
    }

    async fn get_portfolio_history(
        &self,
        user_id: &str,
        days: i64,
    ) -> Result<Vec<PortfolioSnapshot>> {
        self.history(user_id, days)
    }

    async fn calculate_performance_metrics(
        &self,
        user_id: &str,
        days: i64,
    ) -> Result<PerformanceMetrics> {
        if let Some(metrics) = self.metrics_cache.get_performance(user_id, days) {
            return Ok(metrics);
        }
        let generation = self.metrics_cache.generation(user_id);

        let snapshots = self.history(user_id, days)?;
        ensure_enough_snapshots(&snapshots)?;

        let benchmark = self.default_benchmark_series(&snapshots).await;
        let metrics = calculate_performance(
            &snapshots,
            self.settings.risk_free_rate,
            benchmark.as_ref(),
        )?;

        self.metrics_cache.put_performance(user_id, days, generation, &metrics);
        Ok(metrics)
    }

    async fn calculate_risk_metrics(&self, user_id: &str, days: i64) -> Result<RiskMetrics> {
        if let Some(metrics) = self.metrics_cache.get_risk(user_id, days) {
            return Ok(metrics);
        }
        let generation = self.metrics_cache.generation(user_id);

        let snapshots = self.history(user_id, days)?;
        ensure_enough_snapshots(&snapshots)?;
        let positions = self.get_current_positions(user_id).await?;

        let correlations = CorrelationMatrix::estimate_from_snapshots(&snapshots);
        let benchmark = self.default_benchmark_series(&snapshots).await;
        let metrics = calculate_risk(
            &snapshots,
            &positions,
            &correlations,
            &self.risk_parameters(),
            benchmark.as_ref(),
        )?;

        self.metrics_cache.put_risk(user_id, days, generation, &metrics);
        Ok(metrics)
    }

    async fn compare_to_benchmark(
        &self,
        user_id: &str,
        benchmark_symbol: &str,
        days: i64,
    ) -> Result<BenchmarkComparison> {
        let symbol = benchmark_symbol.trim().to_uppercase();
        if !self.benchmark_index.is_registered(&symbol) {
            return Err(AnalyticsError::UnknownBenchmark(benchmark_symbol.to_string()).into());
        }
        if let Some(comparison) = self.metrics_cache.get_benchmark(user_id, &symbol, days) {
            return Ok(comparison);
        }
        let generation = self.metrics_cache.generation(user_id);

        let snapshots = self.history(user_id, days)?;
        ensure_enough_snapshots(&snapshots)?;

        let series = self
            .load_benchmark_series(&symbol, &snapshots)
            .await?
            .ok_or_else(|| {
                Error::PriceUnavailable(format!("no index levels for benchmark {}", symbol))
            })?;
        let comparison =
            benchmark::compare_to_benchmark(&snapshots, &series, self.settings.risk_free_rate)?;

        self.metrics_cache.put_benchmark(user_id, days, generation, &comparison);
        debug!(
            "Compared user {} with {} over {} days: outperformance {}",
            user_id, symbol, days, comparison.outperformance
        );
        Ok(comparison)
    }

    fn list_users(&self) -> Result<Vec<String>> {
        self.transaction_repository.list_user_ids()
    }
}
