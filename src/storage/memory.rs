use std::sync::{Mutex, MutexGuard};

use crate::errors::LedgerError;
use crate::ledger::{CondoConfig, Transaction};

use super::{LedgerStore, Result};

#[derive(Debug, Default)]
struct Tables {
    rows: Vec<Transaction>,
    config: CondoConfig,
}

/// Store kept in process memory. Useful for previews and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Transaction>, config: CondoConfig) -> Self {
        Self {
            tables: Mutex::new(Tables { rows, config }),
            offline: false,
        }
    }

    /// A store whose every call fails, as an unreachable backend would.
    pub fn offline() -> Self {
        Self {
            tables: Mutex::default(),
            offline: true,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        if self.offline {
            return Err(LedgerError::Persistence("store is unreachable".into()));
        }
        self.tables
            .lock()
            .map_err(|_| LedgerError::Persistence("store lock poisoned".into()))
    }
}

impl LedgerStore for MemoryStore {
    fn read_transactions(&self) -> Result<Vec<Transaction>> {
        Ok(self.tables()?.rows.clone())
    }

    fn write_transactions(&self, rows: &[Transaction]) -> Result<()> {
        self.tables()?.rows = rows.to_vec();
        Ok(())
    }

    fn read_config(&self) -> Result<CondoConfig> {
        Ok(self.tables()?.config.clone())
    }

    fn write_config(&self, config: &CondoConfig) -> Result<()> {
        self.tables()?.config = config.clone();
        Ok(())
    }
}
