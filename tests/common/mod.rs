#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Mutex;

use chrono::NaiveDate;
use condo_ledger::{
    config::{ConfigManager, Settings},
    core::CondoManager,
    ledger::{CondoConfig, Ledger},
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// A fresh directory that outlives the calling test.
pub fn temp_base() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Creates isolated managers backed by a unique directory for each test.
pub fn setup_test_env() -> (CondoManager, ConfigManager, PathBuf) {
    let base = temp_base();
    let config_manager =
        ConfigManager::with_base_dir(base.clone()).expect("create config manager for temp dir");
    let settings = config_manager.load().expect("load settings");
    let manager = CondoManager::open(Some(base.clone()), settings).expect("open json store");
    (manager, config_manager, base)
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

/// Two rooms and two apartments.
pub fn small_building() -> CondoConfig {
    CondoConfig::new(
        ["Reserve Fund", "Maintenance"],
        ["Room 01", "Room 02", "Apartment 101", "Apartment 102"],
    )
}

pub fn empty_ledger() -> Ledger {
    Ledger::new(small_building())
}

pub fn default_settings() -> Settings {
    Settings::default()
}

pub fn approx(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}
