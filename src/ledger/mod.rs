//! Ledger rows, configuration lists, unit groups, periods and classification rules.

pub mod category;
pub mod classifier;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod period;
pub mod transaction;
pub mod unit;

pub use category::CondoConfig;
pub use classifier::{is_mirrored_extra, is_pass_through, is_shared_extra, ExpenseBucket, RowTags};
pub use ledger::Ledger;
pub use period::PeriodFilter;
pub use transaction::{RawTransaction, Transaction, TransactionKind};
pub use unit::{UnitGroup, UnitGroups};
