use chrono::{NaiveDateTime, Utc};
use dirs::home_dir;
use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use crate::errors::LedgerError;

const DEFAULT_DIR_NAME: &str = ".condo_ledger";
const HOME_ENV: &str = "CONDO_LEDGER_HOME";
const TRANSACTIONS_FILE: &str = "transactions.json";
const CONFIG_FILE: &str = "config.json";
const SETTINGS_FILE: &str = "settings.json";
const BACKUP_DIR: &str = "backups";
const SETTINGS_BACKUP_DIR: &str = "settings_backups";
const BACKUP_EXTENSION: &str = "json";
const BACKUP_STAMP_FORMAT: &str = "%Y%m%d_%H%M";
const TMP_SUFFIX: &str = "tmp";

/// Returns the application data directory, defaulting to `~/.condo_ledger`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os(HOME_ENV) {
        return PathBuf::from(custom);
    }
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn ensure_dir(path: &Path) -> Result<(), LedgerError> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// File layout under a data directory.
pub struct PathResolver;

impl PathResolver {
    pub fn base_dir() -> PathBuf {
        app_data_dir()
    }

    /// Uses `root` when given, otherwise the default data directory.
    pub fn resolve_base(root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(Self::base_dir)
    }

    pub fn transactions_file_in(base: &Path) -> PathBuf {
        base.join(TRANSACTIONS_FILE)
    }

    pub fn config_file_in(base: &Path) -> PathBuf {
        base.join(CONFIG_FILE)
    }

    pub fn settings_file_in(base: &Path) -> PathBuf {
        base.join(SETTINGS_FILE)
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join(BACKUP_DIR)
    }

    pub fn settings_backup_dir_in(base: &Path) -> PathBuf {
        base.join(SETTINGS_BACKUP_DIR)
    }

}

/// Stages `data` in a sibling `.tmp` file, then renames it over `path`.
pub fn write_atomic(path: &Path, data: &str) -> Result<(), LedgerError> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// A directory of timestamped copies named `<prefix>_<YYYYMMDD>_<HHMM>[_note].json`.
#[derive(Debug, Clone)]
pub struct BackupDir {
    dir: PathBuf,
}

impl BackupDir {
    pub fn new(dir: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&dir)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// File name for a copy taken now.
    pub fn name_for(&self, prefix: &str, note: Option<&str>) -> String {
        let mut name = format!("{}_{}", prefix, Utc::now().format(BACKUP_STAMP_FORMAT));
        if let Some(note) = note {
            name.push('_');
            name.push_str(note);
        }
        name.push('.');
        name.push_str(BACKUP_EXTENSION);
        name
    }

    /// Copies `source` into the directory and drops all but the newest `keep` copies.
    pub fn snapshot(&self, source: &Path, prefix: &str, keep: usize) -> Result<String, LedgerError> {
        let name = self.name_for(prefix, None);
        fs::copy(source, self.dir.join(&name))?;
        self.prune(prefix, keep)?;
        Ok(name)
    }

    /// Names carrying `prefix`, newest first.
    pub fn list(&self, prefix: &str) -> Result<Vec<String>, LedgerError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries: Vec<(NaiveDateTime, String)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if let Some(stamp) = backup_stamp(&name, prefix) {
                entries.push((stamp, name));
            }
        }
        entries.sort_by(|a, b| b.cmp(a));
        Ok(entries.into_iter().map(|(_, name)| name).collect())
    }

    pub fn prune(&self, prefix: &str, keep: usize) -> Result<(), LedgerError> {
        for stale in self.list(prefix)?.iter().skip(keep.max(1)) {
            let _ = fs::remove_file(self.dir.join(stale));
        }
        Ok(())
    }
}

fn backup_stamp(name: &str, prefix: &str) -> Option<NaiveDateTime> {
    let rest = name
        .strip_suffix(BACKUP_EXTENSION)?
        .strip_suffix('.')?
        .strip_prefix(prefix)?
        .strip_prefix('_')?;
    let mut segments = rest.split('_');
    let date_part = segments.next()?;
    let time_part = segments.next()?;
    if !is_digits(date_part, 8) || !is_digits(time_part, 4) {
        return None;
    }
    NaiveDateTime::parse_from_str(&format!("{}{}", date_part, time_part), "%Y%m%d%H%M").ok()
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_relative_to_base() {
        let base = PathBuf::from("/data/condo");
        assert_eq!(
            PathResolver::transactions_file_in(&base),
            PathBuf::from("/data/condo/transactions.json")
        );
        assert_eq!(
            PathResolver::backup_dir_in(&base),
            PathBuf::from("/data/condo/backups")
        );
        assert_eq!(
            PathResolver::resolve_base(Some(base.clone())),
            base
        );
    }

    #[test]
    fn atomic_write_leaves_no_tmp_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("nested").join("doc.json");
        write_atomic(&path, "[]").unwrap();
        write_atomic(&path, "[1]").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "[1]");
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn backups_are_listed_newest_first_and_filtered_by_prefix() {
        let temp = tempfile::TempDir::new().unwrap();
        let backups = BackupDir::new(temp.path().join("backups")).unwrap();
        for name in [
            "ledger_20240101_0900.json",
            "ledger_20240301_0800_before-import.json",
            "ledger_20240201_1000.json",
            "ledger_latest.json",
            "settings_20250101_0000.json",
        ] {
            fs::write(backups.path().join(name), "{}").unwrap();
        }
        assert_eq!(
            backups.list("ledger").unwrap(),
            vec![
                "ledger_20240301_0800_before-import.json",
                "ledger_20240201_1000.json",
                "ledger_20240101_0900.json",
            ]
        );
        backups.prune("ledger", 1).unwrap();
        assert_eq!(backups.list("ledger").unwrap().len(), 1);
        assert_eq!(backups.list("settings").unwrap().len(), 1);
    }
}
