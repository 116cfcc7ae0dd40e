use std::sync::Arc;

use crate::{config::Config, domain_events::WebDomainEventSink};
use ledgerfolio_core::{
    portfolio::{
        benchmark::{BenchmarkIndexTrait, MarketDataBenchmarkIndex},
        PortfolioService, PortfolioServiceTrait,
    },
    quotes::{MarketDataPriceSource, PriceSourceTrait},
};
use ledgerfolio_market_data::{MarketDataProvider, RetryPolicy, RetryingProvider, YahooProvider};
use ledgerfolio_storage_sqlite::{
    db::{self, write_actor},
    portfolio::snapshot::SnapshotRepository,
    transactions::TransactionRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

pub struct AppState {
    pub portfolio_service: Arc<dyn PortfolioServiceTrait>,
}

pub fn init_tracing() {
    let log_format = std::env::var("LF_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Builds the state with Yahoo Finance as price and benchmark source.
pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    let provider: Arc<dyn MarketDataProvider> = Arc::new(RetryingProvider::new(
        YahooProvider::new(config.quote_currency.clone())?,
        RetryPolicy::default(),
    ));
    let price_source = Arc::new(MarketDataPriceSource::new(
        provider.clone(),
        config.quote_currency.clone(),
    ));
    let benchmark_index = Arc::new(MarketDataBenchmarkIndex::new(provider));
    build_state_with(config, price_source, benchmark_index).await
}

/// Builds the state around the given price and benchmark sources.
pub async fn build_state_with(
    config: &Config,
    price_source: Arc<dyn PriceSourceTrait>,
    benchmark_index: Arc<dyn BenchmarkIndexTrait>,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = write_actor::spawn_writer((*pool).clone());

    let transaction_repository = Arc::new(TransactionRepository::new(pool.clone(), writer.clone()));
    let snapshot_repository = Arc::new(SnapshotRepository::new(pool.clone(), writer));

    let domain_event_sink = Arc::new(WebDomainEventSink::new());
    domain_event_sink.start_worker();

    tracing::info!(
        "Portfolio settings: oversell policy {}, risk-free rate {}, default benchmark {:?}",
        config.portfolio.oversell_policy,
        config.portfolio.risk_free_rate,
        config.portfolio.default_benchmark
    );
    let portfolio_service: Arc<dyn PortfolioServiceTrait> = Arc::new(PortfolioService::new(
        transaction_repository,
        snapshot_repository,
        price_source,
        benchmark_index,
        domain_event_sink,
        config.portfolio.clone(),
    ));

    Ok(Arc::new(AppState { portfolio_service }))
}
