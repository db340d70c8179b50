use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::core::utils::{ensure_dir, write_atomic, BackupDir, PathResolver};
use crate::currency::LocaleConfig;
use crate::errors::LedgerError;

const BACKUP_PREFIX: &str = "settings";
const DEFAULT_BUILDING_NAME: &str = "San Rafael Building";
const DEFAULT_BACKUP_RETENTION: usize = 5;

/// Application settings stored next to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Printed at the top of every report.
    pub building_name: String,
    pub locale: LocaleConfig,
    pub backup_retention: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            building_name: DEFAULT_BUILDING_NAME.into(),
            locale: LocaleConfig::default(),
            backup_retention: DEFAULT_BACKUP_RETENTION,
        }
    }
}

/// Loads and saves `settings.json`.
///
/// Saving over an existing file first copies it to `settings_backups/`,
/// keeping the newest `backup_retention` copies.
pub struct ConfigManager {
    path: PathBuf,
    backups: BackupDir,
}

impl ConfigManager {
    pub fn new() -> Result<Self, LedgerError> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self, LedgerError> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::settings_file_in(&base),
            backups: BackupDir::new(PathResolver::settings_backup_dir_in(&base))?,
        })
    }

    pub fn load(&self) -> Result<Settings, LedgerError> {
        if !self.path.exists() {
            return Ok(Settings::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data)
            .map_err(|err| LedgerError::Config(format!("{}: {}", self.path.display(), err)))
    }

    pub fn save(&self, settings: &Settings) -> Result<(), LedgerError> {
        if self.path.exists() {
            let kept = self
                .backups
                .snapshot(&self.path, BACKUP_PREFIX, settings.backup_retention)?;
            debug!(backup = %kept, "previous settings kept");
        }
        write_atomic(&self.path, &serde_json::to_string_pretty(settings)?)?;
        info!(path = %self.path.display(), building = %settings.building_name, "settings saved");
        Ok(())
    }

    /// Writes a labelled copy of `settings` and returns its file name.
    pub fn backup(&self, settings: &Settings, note: &str) -> Result<String, LedgerError> {
        let label = note_label(note)
            .ok_or_else(|| LedgerError::Config("backup label must not be blank".into()))?;
        let name = self.backups.name_for(BACKUP_PREFIX, Some(&label));
        write_atomic(&self.backups.path().join(&name), &serde_json::to_string_pretty(settings)?)?;
        info!(backup = %name, "settings backup written");
        Ok(name)
    }

    /// Stored copies, newest first.
    pub fn list_backups(&self) -> Result<Vec<String>, LedgerError> {
        self.backups.list(BACKUP_PREFIX)
    }

    /// Makes a stored copy the current settings and returns it.
    pub fn restore(&self, backup_name: &str) -> Result<Settings, LedgerError> {
        let path = self.backups.path().join(backup_name);
        if !path.exists() {
            return Err(LedgerError::Config(format!(
                "settings backup `{}` not found",
                backup_name
            )));
        }
        let settings: Settings = serde_json::from_str(&fs::read_to_string(&path)?)?;
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Lowercase words joined by dashes, e.g. `Before rename` -> `before-rename`.
fn note_label(note: &str) -> Option<String> {
    let words: Vec<String> = note
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join("-"))
    }
}
