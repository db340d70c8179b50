use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::currency::{normalize, RawAmount};

use super::category::ADJUSTMENT;

const STORE_DATE_FORMAT: &str = "%Y-%m-%d";
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];
/// Income below this value is a legacy debt record.
const LEGACY_DEBT_THRESHOLD: f64 = -0.01;

/// Status label for rows that need no follow-up.
pub const STATUS_OK: &str = "Ok";

/// Direction of a ledger row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    /// Parses a stored kind label, accepting the legacy Portuguese labels.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "income" | "entrada" => Some(TransactionKind::Income),
            "expense" | "saída" | "saida" => Some(TransactionKind::Expense),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        }
    }
}

/// One ledger row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub date: NaiveDate,
    pub kind: TransactionKind,
    pub category: String,
    pub unit: String,
    pub description: String,
    pub value: f64,
    pub status: String,
}

impl Transaction {
    pub fn new(
        date: NaiveDate,
        kind: TransactionKind,
        category: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
        value: f64,
    ) -> Self {
        Self {
            id: new_id(),
            date,
            kind,
            category: category.into(),
            unit: unit.into(),
            description: description.into(),
            value,
            status: STATUS_OK.into(),
        }
    }

    pub fn income(
        date: NaiveDate,
        category: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
        value: f64,
    ) -> Self {
        Self::new(date, TransactionKind::Income, category, unit, description, value)
    }

    pub fn expense(
        date: NaiveDate,
        category: impl Into<String>,
        unit: impl Into<String>,
        description: impl Into<String>,
        value: f64,
    ) -> Self {
        Self::new(date, TransactionKind::Expense, category, unit, description, value)
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// Converts the row into its stored shape.
    pub fn to_raw(&self) -> RawTransaction {
        RawTransaction {
            id: Some(self.id.clone()),
            date: Some(self.date.format(STORE_DATE_FORMAT).to_string()),
            kind: Some(self.kind.label().to_string()),
            category: Some(self.category.clone()),
            unit: Some(self.unit.clone()),
            description: Some(self.description.clone()),
            value: RawAmount::Number(self.value),
            status: Some(self.status.clone()),
        }
    }
}

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A row exactly as the store holds it: every cell optional, values untyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub value: RawAmount,
    #[serde(default)]
    pub status: Option<String>,
}

impl RawTransaction {
    /// Cleans a stored row. Returns `None` when the date or kind is unusable.
    pub fn into_transaction(self) -> Option<Transaction> {
        let Some(date) = self.date.as_deref().and_then(parse_date) else {
            debug!(id = ?self.id, date = ?self.date, "dropping row with unparsable date");
            return None;
        };
        let Some(kind) = self.kind.as_deref().and_then(TransactionKind::parse) else {
            warn!(id = ?self.id, kind = ?self.kind, "dropping row with unknown kind");
            return None;
        };
        let id = match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() && !id.eq_ignore_ascii_case("nan") => id.to_string(),
            _ => new_id(),
        };
        let value = normalize(self.value);
        let mut category = self.category.unwrap_or_default();
        if kind == TransactionKind::Income && value < LEGACY_DEBT_THRESHOLD {
            category = ADJUSTMENT.to_string();
        }
        Some(Transaction {
            id,
            date,
            kind,
            category,
            unit: self.unit.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default(),
            value,
            status: self.status.unwrap_or_else(|| STATUS_OK.to_string()),
        })
    }
}

/// Parses the date shapes spreadsheets produce. Time components are discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|format| {
                NaiveDateTime::parse_from_str(trimmed, format)
                    .ok()
                    .map(|stamp| stamp.date())
            })
        })
}

/// Cleans every stored row, dropping the unusable ones.
///
/// Ids are unique afterwards: a repeated id keeps its first row and every
/// later row gets a fresh one.
pub fn clean_rows(rows: Vec<RawTransaction>) -> Vec<Transaction> {
    let total = rows.len();
    let mut seen = HashSet::with_capacity(total);
    let cleaned: Vec<Transaction> = rows
        .into_iter()
        .filter_map(RawTransaction::into_transaction)
        .map(|mut txn| {
            if !seen.insert(txn.id.clone()) {
                let fresh = new_id();
                warn!(duplicate = %txn.id, fresh = %fresh, "reassigning repeated transaction id");
                txn.id = fresh.clone();
                seen.insert(fresh);
            }
            txn
        })
        .collect();
    if cleaned.len() < total {
        warn!(
            dropped = total - cleaned.len(),
            kept = cleaned.len(),
            "dropped unusable ledger rows on load"
        );
    }
    cleaned
}
