use std::collections::HashMap;
use std::str::FromStr;
use std::{net::SocketAddr, time::Duration};

use anyhow::{anyhow, Context};
use ledgerfolio_core::portfolio::{OversellPolicy, PortfolioSettings};
use rust_decimal::Decimal;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
    /// `None` disables the snapshot scheduler
    pub snapshot_interval: Option<Duration>,
    /// Currency prices and benchmark levels are quoted in
    pub quote_currency: String,
    pub portfolio: PortfolioSettings,
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("Invalid {} '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

/// Parses `BTC=0.95,ETH=0.9` into a symbol -> score map.
fn parse_liquidity_scores(raw: &str) -> anyhow::Result<HashMap<String, Decimal>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (symbol, score) = pair
                .split_once('=')
                .ok_or_else(|| anyhow!("expected SYMBOL=SCORE, got '{}'", pair))?;
            let score = Decimal::from_str(score.trim())
                .with_context(|| format!("invalid score for {}", symbol.trim()))?;
            Ok((symbol.trim().to_uppercase(), score))
        })
        .collect()
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let listen_addr: SocketAddr = env_parse("LF_LISTEN_ADDR", ([0, 0, 0, 0], 8080).into())?;
        let db_path = env_var("LF_DB_PATH").unwrap_or_else(|| "./db/ledgerfolio.db".into());
        let cors_allow = env_var("LF_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = env_parse("LF_REQUEST_TIMEOUT_MS", 30_000)?;
        let interval_secs: u64 = env_parse("LF_SNAPSHOT_INTERVAL_SECS", 3_600)?;
        let quote_currency = env_var("LF_QUOTE_CURRENCY")
            .unwrap_or_else(|| "USD".into())
            .to_uppercase();

        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
            snapshot_interval: (interval_secs > 0).then(|| Duration::from_secs(interval_secs)),
            quote_currency,
            portfolio: Self::portfolio_settings_from_env()?,
        })
    }

    fn portfolio_settings_from_env() -> anyhow::Result<PortfolioSettings> {
        let defaults = PortfolioSettings::default();

        let default_benchmark = match env_var("LF_DEFAULT_BENCHMARK") {
            Some(symbol) if symbol.eq_ignore_ascii_case("none") => None,
            Some(symbol) => Some(symbol.to_uppercase()),
            None => defaults.default_benchmark.clone(),
        };
        let liquidity_scores = match env_var("LF_LIQUIDITY_SCORES") {
            Some(raw) => parse_liquidity_scores(&raw).context("Invalid LF_LIQUIDITY_SCORES")?,
            None => defaults.liquidity_scores.clone(),
        };

        let settings = PortfolioSettings {
            risk_free_rate: env_parse("LF_RISK_FREE_RATE", defaults.risk_free_rate)?,
            oversell_policy: env_parse::<OversellPolicy>(
                "LF_OVERSELL_POLICY",
                defaults.oversell_policy,
            )?,
            metrics_cache_ttl_secs: env_parse(
                "LF_METRICS_CACHE_TTL_SECS",
                defaults.metrics_cache_ttl_secs,
            )?,
            price_fetch_timeout_ms: env_parse(
                "LF_PRICE_TIMEOUT_MS",
                defaults.price_fetch_timeout_ms,
            )?,
            liquidity_scores,
            default_benchmark,
            ..defaults
        };
        Ok(settings.validate()?)
    }
}
