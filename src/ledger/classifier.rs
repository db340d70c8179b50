//! Pattern rules that tag ledger rows for reconciliation and reporting.
//!
//! Every rule lives here as a named predicate so the free-text matching stays
//! in one testable place.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::category::CONSTRUCTION;
use super::transaction::{Transaction, TransactionKind};

/// Allocation target anywhere inside parentheses, e.g. `Roof repair (All)` or
/// `Intercom (for Unit 3)`. Legacy Portuguese targets are still recognised.
static TARGET_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\([^)]*?\b(?:all|rooms?\s+only|apartments?\s+only|rooms?|apartments?|units?|todos|s[óo]\s+salas|s[óo]\s+aptos)\b",
    )
    .expect("target annotation pattern")
});
static EXTRA_CATEGORY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)fee|extra|construction|improvements|maintenance").expect("extra category pattern")
});
static ALLOCATION_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)allocation|rateio").expect("allocation pattern"));
static FUND_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)fund|fundo").expect("fund pattern"));
static ADJUSTMENT_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)adjustment|ajuste").expect("adjustment pattern"));
static INITIAL_BALANCE_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)initial\s+balance|saldo\s+inicial").expect("initial balance pattern"));
static WATER_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)water|[áa]gua").expect("water pattern"));
static ELECTRICITY_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)electricity|\bluz\b").expect("electricity pattern"));
static CLEANING_CATEGORY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)cleaning|limpeza").expect("cleaning pattern"));
static PETTY_CASH_OR_REPAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)box|cash|repair").expect("petty cash pattern"));
static REPAIR: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)repair").expect("repair pattern"));
static CLEANING_EXCLUSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)box|cash|repair|maintenance").expect("cleaning exclusions"));
static BRACKET_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]']").expect("bracket noise"));

/// True when the description carries a bracketed allocation target.
pub fn has_target_annotation(description: &str) -> bool {
    TARGET_ANNOTATION.is_match(description)
}

/// An income row collected from units for an ad hoc shared charge.
///
/// Routine allocation rows are never extras, whatever their description says.
pub fn is_shared_extra(row: &Transaction) -> bool {
    row.kind == TransactionKind::Income
        && (has_target_annotation(&row.description) || EXTRA_CATEGORY.is_match(&row.category))
        && !ALLOCATION_CATEGORY.is_match(&row.category)
}

/// The expense row that offsets a collected extra.
pub fn is_mirrored_extra(row: &Transaction) -> bool {
    row.kind == TransactionKind::Expense
        && row.category.contains(CONSTRUCTION)
        && has_target_annotation(&row.description)
}

/// Pass-through rows: collected extras and their mirrored expense.
pub fn is_pass_through(row: &Transaction) -> bool {
    is_shared_extra(row) || is_mirrored_extra(row)
}

pub fn is_allocation(row: &Transaction) -> bool {
    ALLOCATION_CATEGORY.is_match(&row.category)
}

pub fn is_fund(row: &Transaction) -> bool {
    FUND_CATEGORY.is_match(&row.category)
}

pub fn is_adjustment(row: &Transaction) -> bool {
    ADJUSTMENT_CATEGORY.is_match(&row.category)
}

pub fn is_initial_balance(row: &Transaction) -> bool {
    INITIAL_BALANCE_CATEGORY.is_match(&row.category)
}

/// Informational tags for report sections. Rows may match several or none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowTags {
    pub shared_extra: bool,
    pub allocation: bool,
    pub fund: bool,
    pub adjustment: bool,
    pub initial_balance: bool,
}

impl RowTags {
    pub fn of(row: &Transaction) -> Self {
        Self {
            shared_extra: is_shared_extra(row),
            allocation: is_allocation(row),
            fund: is_fund(row),
            adjustment: is_adjustment(row),
            initial_balance: is_initial_balance(row),
        }
    }

    /// Income that is neither a routine share, a fund, an adjustment nor the opening balance.
    pub fn is_unit_extra(&self) -> bool {
        !(self.allocation || self.fund || self.adjustment || self.initial_balance)
    }
}

/// Fixed report buckets for expense rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExpenseBucket {
    Water,
    Electricity,
    Cleaning,
    MirroredExtra,
    Other,
}

impl ExpenseBucket {
    pub fn of(row: &Transaction) -> Self {
        let category = row.category.as_str();
        if WATER_CATEGORY.is_match(category) && !PETTY_CASH_OR_REPAIR.is_match(category) {
            ExpenseBucket::Water
        } else if ELECTRICITY_CATEGORY.is_match(category) && !REPAIR.is_match(category) {
            ExpenseBucket::Electricity
        } else if CLEANING_CATEGORY.is_match(category) && !CLEANING_EXCLUSIONS.is_match(category) {
            ExpenseBucket::Cleaning
        } else if is_mirrored_extra(row) {
            ExpenseBucket::MirroredExtra
        } else {
            ExpenseBucket::Other
        }
    }
}

/// Display name for an extra, without its target annotation or legacy prefix.
pub fn extra_display_name(description: &str) -> String {
    let cleaned = BRACKET_NOISE.replace_all(description, "");
    let cleaned = cleaned.replace("Extra: ", "");
    cleaned
        .trim()
        .split('(')
        .next()
        .unwrap_or_default()
        .trim()
        .to_string()
}
