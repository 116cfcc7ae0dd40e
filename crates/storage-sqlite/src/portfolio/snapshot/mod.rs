//! SQLite storage implementation for portfolio snapshots.

mod model;
mod repository;

pub use model::{AssetPnlDB, PortfolioSnapshotDB};
pub use repository::SnapshotRepository;

// Re-export trait from core for convenience
pub use ledgerfolio_core::portfolio::snapshot::SnapshotRepositoryTrait;
