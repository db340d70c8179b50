pub mod json_backend;
pub mod memory;

use crate::errors::LedgerError;
use crate::ledger::{CondoConfig, Transaction};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Persistent home of the transaction table and the configuration lists.
///
/// Every write replaces the whole table. There is no row-level locking, so two
/// writers working from the same snapshot silently overwrite each other: the
/// last write wins. Callers must assemble the complete final row set before
/// calling [`LedgerStore::write_transactions`].
pub trait LedgerStore: Send + Sync {
    /// Rows in stored order, with unparsable dates dropped and missing ids backfilled.
    fn read_transactions(&self) -> Result<Vec<Transaction>>;
    fn write_transactions(&self, rows: &[Transaction]) -> Result<()>;
    fn read_config(&self) -> Result<CondoConfig>;
    fn write_config(&self, config: &CondoConfig) -> Result<()>;
}

pub use json_backend::JsonStorage;
pub use memory::MemoryStore;
