/// Decimal precision for persisted ledger and snapshot values
pub const DECIMAL_PRECISION: u32 = 10;

/// Decimal precision for analytics results
pub const METRICS_DECIMAL_PRECISION: u32 = 8;

/// Quantity threshold for significant positions
pub const QUANTITY_THRESHOLD: &str = "0.00000001";

/// Calendar days used to annualize returns and volatility
pub const DAYS_PER_YEAR: u32 = 365;

/// Minimum number of snapshots needed to derive a return series
pub const MIN_SNAPSHOTS_FOR_METRICS: usize = 2;

/// Version stamped on every metrics result struct
pub const METRICS_SCHEMA_VERSION: u32 = 1;

/// Default window for history and metrics requests
pub const DEFAULT_WINDOW_DAYS: i64 = 30;
