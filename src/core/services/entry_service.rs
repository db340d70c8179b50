//! Validated helpers for hand-entered ledger rows.

use chrono::NaiveDate;
use tracing::info;

use crate::core::services::{invalid, ServiceError, ServiceResult};
use crate::currency::{normalize, RawAmount};
use crate::ledger::category::{BUILDING_GENERAL_UNIT, CASH_UNIT, INITIAL_BALANCE};
use crate::ledger::{Ledger, Transaction, TransactionKind};

/// An ad hoc entry as typed by the operator.
#[derive(Debug, Clone)]
pub struct NewEntry {
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    /// Defaults to the building-wide unit.
    pub unit: Option<String>,
    pub description: String,
    pub amount: RawAmount,
}

pub struct EntryService;

impl EntryService {
    /// Appends an ad hoc income or expense and returns its id.
    pub fn add_entry(ledger: &mut Ledger, entry: NewEntry) -> ServiceResult<String> {
        let description = entry.description.trim();
        if description.is_empty() {
            return invalid("Description is required");
        }
        let amount = normalize(entry.amount);
        if amount <= 0.0 {
            return invalid("Amount must be greater than zero");
        }
        let unit = entry
            .unit
            .map(|unit| unit.trim().to_string())
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| BUILDING_GENERAL_UNIT.to_string());
        let txn = Transaction::new(
            entry.date,
            entry.kind,
            entry.category.trim(),
            unit,
            description,
            amount,
        );
        let id = ledger.add_transaction(txn);
        info!(id = %id, kind = entry.kind.label(), amount, "entry added");
        Ok(id)
    }

    /// Records the cash the building held when bookkeeping started.
    pub fn set_initial_balance(
        ledger: &mut Ledger,
        date: NaiveDate,
        amount: impl Into<RawAmount>,
    ) -> ServiceResult<String> {
        let amount = normalize(amount);
        if amount == 0.0 {
            return invalid("Initial balance must not be zero");
        }
        let txn = Transaction::income(date, INITIAL_BALANCE, CASH_UNIT, INITIAL_BALANCE, amount);
        let id = ledger.add_transaction(txn);
        info!(id = %id, amount, "initial balance recorded");
        Ok(id)
    }

    pub fn remove(ledger: &mut Ledger, id: &str) -> ServiceResult<Transaction> {
        ledger
            .remove_transaction(id)
            .ok_or_else(|| ServiceError::Invalid("Transaction not found".into()))
    }

    /// Writes an edited view back; see [`Ledger::merge_edits`].
    pub fn save_edits(ledger: &mut Ledger, visible_ids: &[String], edited: Vec<Transaction>) {
        ledger.merge_edits(visible_ids, edited);
    }
}
