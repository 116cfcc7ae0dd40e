//! Text codecs shared by the row models.
//!
//! SQLite has no decimal or timezone-aware timestamp type, so both are stored
//! as text. Timestamps use a fixed-width UTC format so lexical order equals
//! chronological order.

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::errors::StorageError;

/// Fixed-width UTC timestamp format with nanosecond precision.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.format(TIMESTAMP_FORMAT).to_string()
}

pub fn parse_timestamp(
    table: &'static str,
    field: &str,
    value: &str,
) -> Result<DateTime<Utc>, StorageError> {
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.with_timezone(&Utc)))
        .map_err(|e| StorageError::corrupt(table, format!("{} '{}': {}", field, value, e)))
}

pub fn parse_decimal(table: &'static str, field: &str, value: &str) -> Result<Decimal, StorageError> {
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map_err(|e| StorageError::corrupt(table, format!("{} '{}': {}", field, value, e)))
}

pub fn parse_optional_decimal(
    table: &'static str,
    field: &str,
    value: Option<&str>,
) -> Result<Option<Decimal>, StorageError> {
    value.map(|v| parse_decimal(table, field, v)).transpose()
}
