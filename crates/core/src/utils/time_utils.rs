use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

const SECONDS_PER_DAY: i64 = 86_400;

/// Fractional number of days between two instants (negative if `end` precedes `start`).
pub fn fractional_days_between(start: DateTime<Utc>, end: DateTime<Utc>) -> Decimal {
    let seconds = (end - start).num_seconds();
    Decimal::from(seconds) / Decimal::from(SECONDS_PER_DAY)
}

/// Start of a trailing window of `days` days ending at `now`.
///
/// Windows too large for chrono collapse to the minimum representable instant.
pub fn window_start(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
