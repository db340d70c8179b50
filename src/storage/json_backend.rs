use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    config::Settings,
    core::utils::{ensure_dir, write_atomic, BackupDir, PathResolver},
    errors::LedgerError,
    ledger::{
        transaction::{clean_rows, RawTransaction},
        CondoConfig, Transaction,
    },
};

use super::{LedgerStore, Result};

const DEFAULT_RETENTION: usize = 5;

/// File-backed store: `transactions.json` and `config.json` under one directory.
///
/// Each write copies the previous file to `backups/<stem>_<YYYYMMDD_HHMM>.json`
/// and keeps only the newest `retention` copies per file.
#[derive(Debug, Clone)]
pub struct JsonStorage {
    root: PathBuf,
    backups: BackupDir,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let app_root = PathResolver::resolve_base(root);
        ensure_dir(&app_root)?;
        let backups = BackupDir::new(PathResolver::backup_dir_in(&app_root))?;
        Ok(Self {
            root: app_root,
            backups,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    /// Opens the store with the retention configured in `settings`.
    pub fn from_settings(root: Option<PathBuf>, settings: &Settings) -> Result<Self> {
        Self::new(root, Some(settings.backup_retention))
    }

    pub fn base_dir(&self) -> &Path {
        &self.root
    }

    pub fn retention(&self) -> usize {
        self.retention
    }

    pub fn transactions_path(&self) -> PathBuf {
        PathResolver::transactions_file_in(&self.root)
    }

    pub fn config_path(&self) -> PathBuf {
        PathResolver::config_file_in(&self.root)
    }

    /// Backup file names for a stored file stem, newest first.
    pub fn list_backups(&self, stem: &str) -> Result<Vec<String>> {
        self.backups.list(&canonical_name(stem))
    }

    /// Copies a backup over the live file it was taken from.
    pub fn restore(&self, stem: &str, backup_name: &str) -> Result<PathBuf> {
        let backup_path = self.backups.path().join(backup_name);
        if !backup_path.exists() {
            return Err(LedgerError::Persistence(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let target = self.root.join(format!("{}.json", canonical_name(stem)));
        fs::copy(&backup_path, &target)?;
        info!(backup = backup_name, target = %target.display(), "restored backup");
        Ok(target)
    }

    fn write_document(&self, path: &Path, json: &str) -> Result<()> {
        if path.exists() {
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                let name = self
                    .backups
                    .snapshot(path, &canonical_name(stem), self.retention)?;
                debug!(backup = %name, "previous file kept");
            }
        }
        write_atomic(path, json)
    }
}

impl LedgerStore for JsonStorage {
    fn read_transactions(&self) -> Result<Vec<Transaction>> {
        let path = self.transactions_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&path)?;
        let rows: Vec<RawTransaction> = serde_json::from_str(&data)?;
        debug!(path = %path.display(), rows = rows.len(), "read stored rows");
        Ok(clean_rows(rows))
    }

    fn write_transactions(&self, rows: &[Transaction]) -> Result<()> {
        let raw: Vec<RawTransaction> = rows.iter().map(Transaction::to_raw).collect();
        let json = serde_json::to_string_pretty(&raw)?;
        let path = self.transactions_path();
        self.write_document(&path, &json)?;
        info!(path = %path.display(), rows = rows.len(), "ledger saved");
        Ok(())
    }

    fn read_config(&self) -> Result<CondoConfig> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(CondoConfig::default());
        }
        let data = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&data)?)
    }

    fn write_config(&self, config: &CondoConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        self.write_document(&self.config_path(), &json)?;
        info!(
            categories = config.categories.len(),
            units = config.units.len(),
            "configuration saved"
        );
        Ok(())
    }
}

/// Lowercase ASCII name safe for backup prefixes.
fn canonical_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '-',
        })
        .collect();
    if sanitized.trim_matches('-').is_empty() {
        "ledger".into()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::category::RESERVE_FUND;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn storage_with_temp_dir() -> (JsonStorage, TempDir) {
        let temp = TempDir::new().expect("temp dir");
        let storage =
            JsonStorage::new(Some(temp.path().to_path_buf()), Some(3)).expect("json storage");
        (storage, temp)
    }

    #[test]
    fn empty_store_reads_as_empty() {
        let (storage, _guard) = storage_with_temp_dir();
        assert!(storage.read_transactions().unwrap().is_empty());
        assert!(storage.read_config().unwrap().is_empty());
    }

    #[test]
    fn second_write_leaves_a_backup() {
        let (storage, _guard) = storage_with_temp_dir();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let rows = vec![Transaction::income(date, RESERVE_FUND, "Room 01", "Fund", 50.0)];
        storage.write_transactions(&rows).expect("first save");
        assert!(storage.list_backups("transactions").unwrap().is_empty());
        storage.write_transactions(&rows).expect("second save");
        let backups = storage.list_backups("transactions").unwrap();
        assert_eq!(backups.len(), 1);
        assert!(backups[0].starts_with("transactions_"));
        assert!(storage.list_backups("config").unwrap().is_empty());
    }

    #[test]
    fn retention_comes_from_settings() {
        let temp = TempDir::new().expect("temp dir");
        let settings = Settings {
            backup_retention: 2,
            ..Settings::default()
        };
        let storage =
            JsonStorage::from_settings(Some(temp.path().to_path_buf()), &settings).unwrap();
        assert_eq!(storage.retention(), 2);
        assert_eq!(JsonStorage::new(Some(temp.path().to_path_buf()), None).unwrap().retention(), 5);
    }

    #[test]
    fn odd_stems_get_safe_names() {
        assert_eq!(canonical_name("Transactions"), "transactions");
        assert_eq!(canonical_name("my ledger"), "my-ledger");
        assert_eq!(canonical_name("__"), "ledger");
    }

    #[test]
    fn restore_missing_backup_fails() {
        let (storage, _guard) = storage_with_temp_dir();
        let err = storage.restore("transactions", "nope.json").unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
    }
}
