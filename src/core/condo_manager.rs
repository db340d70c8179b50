use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::billing::BillingRun;
use crate::config::Settings;
use crate::core::services::{
    BillingService, EntryService, NewEntry, ServiceResult, SummaryService,
};
use crate::currency::RawAmount;
use crate::errors::LedgerError;
use crate::ledger::{CondoConfig, Ledger, PeriodFilter, Transaction};
use crate::reconcile::PeriodSummary;
use crate::report::{write_report, ReportPayload, ReportRenderer};
use crate::storage::{JsonStorage, LedgerStore};

/// What a load produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadOutcome {
    pub rows: usize,
    /// Store failures that were replaced by empty data.
    pub warnings: Vec<String>,
    /// True when the configuration lists came from the built-in seed.
    pub seeded_config: bool,
}

/// Owns the working ledger and moves it to and from the store.
///
/// Every mutating call finishes with a wholesale save of the affected table.
pub struct CondoManager {
    pub current: Ledger,
    settings: Settings,
    storage: Box<dyn LedgerStore>,
}

impl CondoManager {
    pub fn new(storage: Box<dyn LedgerStore>, settings: Settings) -> Self {
        Self {
            current: Ledger::default(),
            settings,
            storage,
        }
    }

    /// Opens the JSON store under `root`, or the default data directory,
    /// keeping as many backups as `settings` asks for.
    pub fn open(root: Option<PathBuf>, settings: Settings) -> Result<Self, LedgerError> {
        let storage = JsonStorage::from_settings(root, &settings)?;
        Ok(Self::new(Box::new(storage), settings))
    }

    pub fn storage(&self) -> &dyn LedgerStore {
        self.storage.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Reloads both tables. Store failures leave an empty ledger, never an error.
    pub fn load(&mut self) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();
        let transactions = match self.storage.read_transactions() {
            Ok(rows) => rows,
            Err(err) => {
                warn!(error = %err, "could not read transactions; continuing with an empty ledger");
                outcome.warnings.push(format!("transactions: {}", err));
                Vec::new()
            }
        };
        let mut config = match self.storage.read_config() {
            Ok(config) => config,
            Err(err) => {
                warn!(error = %err, "could not read configuration; using defaults");
                outcome.warnings.push(format!("configuration: {}", err));
                CondoConfig::default()
            }
        };
        if config.is_empty() {
            config = CondoConfig::seed();
            outcome.seeded_config = true;
        }
        outcome.rows = transactions.len();
        self.current = Ledger {
            transactions,
            config,
        };
        info!(rows = outcome.rows, seeded = outcome.seeded_config, "ledger loaded");
        outcome
    }

    pub fn save(&self) -> Result<(), LedgerError> {
        self.storage.write_transactions(&self.current.transactions)
    }

    pub fn save_config(&mut self, config: CondoConfig) -> Result<(), LedgerError> {
        self.storage.write_config(&config)?;
        self.current.config = config;
        Ok(())
    }

    pub fn commit_billing(&mut self, run: &BillingRun) -> Result<usize, LedgerError> {
        let added = BillingService::commit(&mut self.current, run);
        self.save()?;
        Ok(added)
    }

    pub fn add_entry(&mut self, entry: NewEntry) -> ServiceResult<String> {
        let id = EntryService::add_entry(&mut self.current, entry)?;
        self.save()?;
        Ok(id)
    }

    pub fn set_initial_balance(
        &mut self,
        date: NaiveDate,
        amount: impl Into<RawAmount>,
    ) -> ServiceResult<String> {
        let id = EntryService::set_initial_balance(&mut self.current, date, amount)?;
        self.save()?;
        Ok(id)
    }

    pub fn register_payment(
        &mut self,
        unit: &str,
        amount: impl Into<RawAmount>,
        date: NaiveDate,
    ) -> ServiceResult<String> {
        let id = SummaryService::register_payment(&mut self.current, unit, amount, date)?;
        self.save()?;
        Ok(id)
    }

    pub fn save_edits(
        &mut self,
        visible_ids: &[String],
        edited: Vec<Transaction>,
    ) -> Result<(), LedgerError> {
        EntryService::save_edits(&mut self.current, visible_ids, edited);
        self.save()
    }

    pub fn summary(&self, filter: PeriodFilter) -> PeriodSummary {
        SummaryService::summarize(&self.current, filter)
    }

    pub fn report(&self, filter: PeriodFilter) -> ReportPayload {
        SummaryService::report(&self.current, filter, &self.settings)
    }

    pub fn write_report(
        &self,
        filter: PeriodFilter,
        renderer: &dyn ReportRenderer,
        dir: &Path,
    ) -> Result<PathBuf, LedgerError> {
        write_report(renderer, &self.report(filter), dir)
    }
}
