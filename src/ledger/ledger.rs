use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    category::CondoConfig,
    transaction::{clean_rows, new_id, RawTransaction, Transaction},
    unit::UnitGroups,
};

/// The full transaction table plus the configuration lists it is read with.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub config: CondoConfig,
}

impl Ledger {
    pub fn new(config: CondoConfig) -> Self {
        Self {
            transactions: Vec::new(),
            config,
        }
    }

    /// Builds a ledger from stored rows, applying load-time cleanup.
    pub fn from_raw(rows: Vec<RawTransaction>, config: CondoConfig) -> Self {
        Self {
            transactions: clean_rows(rows),
            config,
        }
    }

    pub fn to_raw(&self) -> Vec<RawTransaction> {
        self.transactions.iter().map(Transaction::to_raw).collect()
    }

    pub fn add_transaction(&mut self, transaction: Transaction) -> String {
        let id = transaction.id.clone();
        self.transactions.push(transaction);
        id
    }

    pub fn extend(&mut self, batch: impl IntoIterator<Item = Transaction>) -> usize {
        let before = self.transactions.len();
        self.transactions.extend(batch);
        self.transactions.len() - before
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn remove_transaction(&mut self, id: &str) -> Option<Transaction> {
        let index = self.transactions.iter().position(|txn| txn.id == id)?;
        Some(self.transactions.remove(index))
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn unit_groups(&self) -> UnitGroups {
        UnitGroups::from_units(&self.config.units)
    }

    /// Applies an edit view back onto the full table.
    ///
    /// `visible_ids` are the rows the editor showed; any of them missing from
    /// `edited` are deleted, edited rows replace their originals by id, and
    /// rows with a blank or repeated id are appended with a fresh one.
    pub fn merge_edits(&mut self, visible_ids: &[String], edited: Vec<Transaction>) {
        let mut edited = edited;
        let mut seen = HashSet::with_capacity(edited.len());
        for row in edited.iter_mut() {
            if row.id.trim().is_empty() || !seen.insert(row.id.clone()) {
                row.id = new_id();
                seen.insert(row.id.clone());
            }
        }
        let kept: HashSet<&str> = edited.iter().map(|row| row.id.as_str()).collect();
        let deleted: HashSet<&str> = visible_ids
            .iter()
            .map(String::as_str)
            .filter(|id| !kept.contains(id))
            .collect();
        let before = self.transactions.len();
        self.transactions
            .retain(|txn| !deleted.contains(txn.id.as_str()) && !kept.contains(txn.id.as_str()));
        debug!(
            deleted = deleted.len(),
            removed = before - self.transactions.len(),
            incoming = edited.len(),
            "merging edited rows"
        );
        self.transactions.extend(edited);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::category::RESERVE_FUND;
    use chrono::NaiveDate;

    fn sample() -> Ledger {
        let date = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        let mut ledger = Ledger::new(CondoConfig::seed());
        for unit in ["Room 01", "Room 02", "Apartment 101"] {
            ledger.add_transaction(Transaction::income(date, RESERVE_FUND, unit, "Fund", 50.0));
        }
        ledger
    }

    #[test]
    fn merge_deletes_replaces_and_appends() {
        let mut ledger = sample();
        let ids: Vec<String> = ledger.transactions.iter().map(|t| t.id.clone()).collect();
        let visible = vec![ids[0].clone(), ids[1].clone()];

        let mut edited_first = ledger.transactions[0].clone();
        edited_first.value = 75.0;
        let mut added = edited_first.clone();
        added.id = String::new();
        added.unit = "Room 03".into();

        ledger.merge_edits(&visible, vec![edited_first, added]);

        assert_eq!(ledger.transaction_count(), 3);
        assert!(ledger.transaction(&ids[1]).is_none());
        assert_eq!(ledger.transaction(&ids[0]).unwrap().value, 75.0);
        assert!(ledger.transaction(&ids[2]).is_some());
        assert!(ledger
            .transactions
            .iter()
            .any(|t| t.unit == "Room 03" && !t.id.is_empty()));
    }

    #[test]
    fn editing_one_of_two_stored_duplicates_keeps_both() {
        let stored: Vec<RawTransaction> = [10.0, 20.0]
            .into_iter()
            .map(|value| {
                let mut row = Transaction::income(
                    NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
                    RESERVE_FUND,
                    "Room 01",
                    "Fund",
                    value,
                )
                .to_raw();
                row.id = Some("dup".into());
                row
            })
            .collect();
        let mut ledger = Ledger::from_raw(stored, CondoConfig::seed());
        assert_ne!(ledger.transactions[0].id, ledger.transactions[1].id);

        let mut edited = ledger.transactions[0].clone();
        edited.value = 15.0;
        ledger.merge_edits(&["dup".to_string()], vec![edited]);

        assert_eq!(ledger.transaction_count(), 2);
        assert_eq!(ledger.transaction("dup").unwrap().value, 15.0);
        assert!(ledger.transactions.iter().any(|t| t.value == 20.0));
    }

    #[test]
    fn repeated_ids_in_an_edit_view_are_split() {
        let mut ledger = sample();
        let id = ledger.transactions[0].id.clone();
        let copy = ledger.transactions[0].clone();
        ledger.merge_edits(&[id.clone()], vec![copy.clone(), copy]);

        assert_eq!(ledger.transaction_count(), 4);
        let ids: HashSet<&str> = ledger.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(id.as_str()));
    }

    #[test]
    fn remove_returns_row() {
        let mut ledger = sample();
        let id = ledger.transactions[0].id.clone();
        let removed = ledger.remove_transaction(&id).unwrap();
        assert_eq!(removed.id, id);
        assert_eq!(ledger.transaction_count(), 2);
    }

    #[test]
    fn unit_groups_follow_config() {
        let ledger = sample();
        let groups = ledger.unit_groups();
        assert_eq!(groups.rooms.len(), 4);
        assert_eq!(groups.apartments.len(), 4);
    }
}
