//! Domain event types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portfolio::snapshot::SnapshotSource;

/// Domain events emitted by core services after successful mutations.
///
/// These events represent facts about domain data changes. They are
/// best-effort notifications; the mutation has already been persisted
/// when an event is emitted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A transaction was appended to the log.
    TransactionRecorded {
        user_id: String,
        transaction_id: String,
        /// Symbols whose positions changed (empty for skipped transactions)
        symbols: Vec<String>,
    },

    /// A portfolio snapshot was persisted.
    SnapshotCreated {
        user_id: String,
        snapshot_id: String,
        source: SnapshotSource,
        timestamp: DateTime<Utc>,
    },

    /// A snapshot valued some assets at their cost basis because no price was available.
    PriceFallbackUsed {
        user_id: String,
        snapshot_id: String,
        symbols: Vec<String>,
    },
}

impl DomainEvent {
    /// Creates a TransactionRecorded event.
    pub fn transaction_recorded(
        user_id: String,
        transaction_id: String,
        symbols: Vec<String>,
    ) -> Self {
        Self::TransactionRecorded {
            user_id,
            transaction_id,
            symbols,
        }
    }

    /// Creates a SnapshotCreated event.
    pub fn snapshot_created(
        user_id: String,
        snapshot_id: String,
        source: SnapshotSource,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::SnapshotCreated {
            user_id,
            snapshot_id,
            source,
            timestamp,
        }
    }

    /// Creates a PriceFallbackUsed event.
    pub fn price_fallback_used(user_id: String, snapshot_id: String, symbols: Vec<String>) -> Self {
        Self::PriceFallbackUsed {
            user_id,
            snapshot_id,
            symbols,
        }
    }

    /// The user the event belongs to.
    pub fn user_id(&self) -> &str {
        match self {
            Self::TransactionRecorded { user_id, .. }
            | Self::SnapshotCreated { user_id, .. }
            | Self::PriceFallbackUsed { user_id, .. } => user_id,
        }
    }
}
