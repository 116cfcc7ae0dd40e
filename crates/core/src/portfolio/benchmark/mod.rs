//! Benchmark comparison - portfolio returns against a named market index.

pub mod benchmark_comparator;
mod benchmark_model;
mod benchmark_traits;
mod market_benchmark_index;
mod static_benchmark_index;

pub use benchmark_comparator::*;
pub use benchmark_model::*;
pub use benchmark_traits::*;
pub use market_benchmark_index::MarketDataBenchmarkIndex;
pub use static_benchmark_index::StaticBenchmarkIndex;
