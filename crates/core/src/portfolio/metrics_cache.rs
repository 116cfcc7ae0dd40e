//! Short-lived memoization of metric results per user and window.

use std::time::{Duration, Instant};

use dashmap::DashMap;
use log::debug;

use super::benchmark::BenchmarkComparison;
use super::performance::PerformanceMetrics;
use super::risk::RiskMetrics;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum MetricFamily {
    Performance,
    Risk,
    Benchmark(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    user_id: String,
    family: MetricFamily,
    window_days: i64,
}

#[derive(Debug, Clone)]
enum CachedMetrics {
    Performance(PerformanceMetrics),
    Risk(RiskMetrics),
    Benchmark(BenchmarkComparison),
}

#[derive(Debug, Clone)]
struct CacheEntry {
    stored_at: Instant,
    metrics: CachedMetrics,
}

/// TTL cache of metric results keyed by (user, metric family, window).
///
/// A zero TTL disables caching. Entries of a user are dropped whenever
/// that user's history changes.
///
/// Each invalidation bumps the user's generation. Writers pass the
/// generation they read before computing, and a result computed against
/// an older generation is not stored.
#[derive(Debug)]
pub struct MetricsCache {
    ttl: Duration,
    entries: DashMap<CacheKey, CacheEntry>,
    generations: DashMap<String, u64>,
}

impl MetricsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    fn key(user_id: &str, family: MetricFamily, window_days: i64) -> CacheKey {
        CacheKey {
            user_id: user_id.to_string(),
            family,
            window_days,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<CachedMetrics> {
        if !self.is_enabled() {
            return None;
        }
        let fresh = self
            .entries
            .get(key)
            .filter(|entry| entry.stored_at.elapsed() < self.ttl)
            .map(|entry| entry.metrics.clone());
        match fresh {
            Some(metrics) => {
                debug!("Metrics cache hit for {:?}", key);
                Some(metrics)
            }
            None => {
                // Drop an expired entry if one exists
                self.entries
                    .remove_if(key, |_, entry| entry.stored_at.elapsed() >= self.ttl);
                debug!("Metrics cache miss for {:?}", key);
                None
            }
        }
    }

    /// Current generation of a user's cached results.
    pub fn generation(&self, user_id: &str) -> u64 {
        self.generations.get(user_id).map(|g| *g).unwrap_or(0)
    }

    fn put(&self, key: CacheKey, generation: u64, metrics: CachedMetrics) {
        if !self.is_enabled() {
            return;
        }
        // Held across the insert so an invalidation cannot slip in between.
        let current = self.generations.get(&key.user_id);
        if current.as_deref().copied().unwrap_or(0) != generation {
            debug!("Discarding metrics computed before invalidation for {:?}", key);
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                stored_at: Instant::now(),
                metrics,
            },
        );
    }

    pub fn get_performance(&self, user_id: &str, window_days: i64) -> Option<PerformanceMetrics> {
        match self.get(&Self::key(user_id, MetricFamily::Performance, window_days)) {
            Some(CachedMetrics::Performance(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn put_performance(
        &self,
        user_id: &str,
        window_days: i64,
        generation: u64,
        metrics: &PerformanceMetrics,
    ) {
        self.put(
            Self::key(user_id, MetricFamily::Performance, window_days),
            generation,
            CachedMetrics::Performance(metrics.clone()),
        );
    }

    pub fn get_risk(&self, user_id: &str, window_days: i64) -> Option<RiskMetrics> {
        match self.get(&Self::key(user_id, MetricFamily::Risk, window_days)) {
            Some(CachedMetrics::Risk(metrics)) => Some(metrics),
            _ => None,
        }
    }

    pub fn put_risk(
        &self,
        user_id: &str,
        window_days: i64,
        generation: u64,
        metrics: &RiskMetrics,
    ) {
        self.put(
            Self::key(user_id, MetricFamily::Risk, window_days),
            generation,
            CachedMetrics::Risk(metrics.clone()),
        );
    }

    pub fn get_benchmark(
        &self,
        user_id: &str,
        benchmark: &str,
        window_days: i64,
    ) -> Option<BenchmarkComparison> {
        let key = Self::key(
            user_id,
            MetricFamily::Benchmark(benchmark.to_string()),
            window_days,
        );
        match self.get(&key) {
            Some(CachedMetrics::Benchmark(comparison)) => Some(comparison),
            _ => None,
        }
    }

    pub fn put_benchmark(
        &self,
        user_id: &str,
        window_days: i64,
        generation: u64,
        comparison: &BenchmarkComparison,
    ) {
        self.put(
            Self::key(
                user_id,
                MetricFamily::Benchmark(comparison.benchmark_symbol.clone()),
                window_days,
            ),
            generation,
            CachedMetrics::Benchmark(comparison.clone()),
        );
    }

    /// Drops every cached result of a user and bumps their generation.
    pub fn invalidate_user(&self, user_id: &str) {
        *self.generations.entry(user_id.to_string()).or_insert(0) += 1;
        self.entries.retain(|key, _| key.user_id != user_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn comparison(symbol: &str) -> BenchmarkComparison {
        BenchmarkComparison {
            schema_version: 1,
            benchmark_symbol: symbol.to_string(),
            start_timestamp: Utc::now(),
            end_timestamp: Utc::now(),
            period_count: 1,
            portfolio_return: Decimal::ONE,
            benchmark_return: Decimal::ZERO,
            outperformance: Decimal::ONE,
            beta: Decimal::ZERO,
            alpha: Decimal::ZERO,
            information_ratio: Decimal::ZERO,
            tracking_error: Decimal::ZERO,
            up_capture: Decimal::ZERO,
            down_capture: Decimal::ZERO,
        }
    }

    #[test]
    fn test_hit_miss_and_invalidation() {
        let cache = MetricsCache::new(Duration::from_secs(60));
        assert!(cache.get_benchmark("u1", "SPX", 30).is_none());

        cache.put_benchmark("u1", 30, 0, &comparison("SPX"));
        cache.put_benchmark("u2", 30, 0, &comparison("SPX"));

        assert!(cache.get_benchmark("u1", "SPX", 30).is_some());
        assert!(cache.get_benchmark("u1", "SPX", 7).is_none());
        assert!(cache.get_benchmark("u1", "NDX", 30).is_none());
        assert!(cache.get_performance("u1", 30).is_none());

        cache.invalidate_user("u1");
        assert!(cache.get_benchmark("u1", "SPX", 30).is_none());
        assert!(cache.get_benchmark("u2", "SPX", 30).is_some());
    }

    #[test]
    fn test_result_from_before_invalidation_is_not_stored() {
        let cache = MetricsCache::new(Duration::from_secs(60));
        let generation = cache.generation("u1");

        cache.invalidate_user("u1");
        cache.put_benchmark("u1", 30, generation, &comparison("SPX"));
        assert!(cache.get_benchmark("u1", "SPX", 30).is_none());

        cache.put_benchmark("u1", 30, cache.generation("u1"), &comparison("SPX"));
        assert!(cache.get_benchmark("u1", "SPX", 30).is_some());

        // Other users keep their own generation
        cache.put_benchmark("u2", 30, generation, &comparison("SPX"));
        assert!(cache.get_benchmark("u2", "SPX", 30).is_some());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache = MetricsCache::new(Duration::ZERO);
        cache.put_benchmark("u1", 30, 0, &comparison("SPX"));
        assert!(cache.is_empty());
        assert!(cache.get_benchmark("u1", "SPX", 30).is_none());
    }

    #[test]
    fn test_expired_entries_are_not_served() {
        let cache = MetricsCache::new(Duration::from_millis(1));
        cache.put_benchmark("u1", 30, 0, &comparison("SPX"));
        std::thread::sleep(Duration::from_millis(5));
        assert!(cache.get_benchmark("u1", "SPX", 30).is_none());
        assert!(cache.is_empty());
    }
}
