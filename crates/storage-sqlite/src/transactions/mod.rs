//! SQLite storage implementation for the transaction log.

mod model;
mod repository;

pub use model::TransactionDB;
pub use repository::TransactionRepository;

// Re-export trait from core for convenience
pub use ledgerfolio_core::transactions::TransactionRepositoryTrait;
