//! Ledger reconciler: period totals, running balances and delinquency.
//!
//! All functions are pure over the rows they are given; an empty ledger
//! simply produces zeros.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ledger::category::ADJUSTMENT;
use crate::ledger::classifier::{is_adjustment, is_initial_balance};
use crate::ledger::{
    is_mirrored_extra, is_pass_through, is_shared_extra, Ledger, PeriodFilter, Transaction,
    TransactionKind,
};

/// Income at or below this value is a recorded debt.
const DEBT_THRESHOLD: f64 = -0.01;
/// Units whose balance is below this value are debtors.
const DEBTOR_THRESHOLD: f64 = -0.05;

/// Balances and totals for one dashboard/report period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PeriodSummary {
    pub filter: Option<PeriodFilter>,
    /// Operating balance before the period plus every opening balance row.
    pub prior_balance: f64,
    pub initial_balance: f64,
    /// Income booked in the period, opening balance rows excluded.
    pub period_income: f64,
    pub period_expense: f64,
    /// `period_income - period_expense`.
    pub period_net: f64,
    /// Period net with collected extras and their mirrored expenses left out.
    pub period_result: f64,
    /// Extras collected from units during the period.
    pub period_extras: f64,
    /// Running balance up to the period's last day.
    pub cumulative_balance: f64,
    /// Cash at the end of the period: prior balance plus period net.
    pub closing_balance: f64,
}

fn sum_values<'a>(rows: impl Iterator<Item = &'a Transaction>) -> f64 {
    rows.map(|row| row.value).sum()
}

fn kind_total<'a, F>(rows: &'a [Transaction], kind: TransactionKind, keep: F) -> f64
where
    F: Fn(&Transaction) -> bool,
{
    sum_values(rows.iter().filter(|&row| row.kind == kind && keep(row)))
}

/// Sum of every opening balance row, whatever its date.
pub fn initial_balance(rows: &[Transaction]) -> f64 {
    sum_values(rows.iter().filter(|row| is_initial_balance(row)))
}

/// Balance carried into the period.
pub fn prior_balance(rows: &[Transaction], filter: PeriodFilter) -> f64 {
    let operating = |row: &Transaction| {
        filter.is_before(row.date) && !is_initial_balance(row) && !is_pass_through(row)
    };
    let income = kind_total(rows, TransactionKind::Income, operating);
    let expense = kind_total(rows, TransactionKind::Expense, operating);
    income - expense + initial_balance(rows)
}

/// Income minus expense up to and including `cutoff` (everything when `None`).
///
/// Collected extras are pass-through money and are left out together with
/// the expense that mirrors them.
pub fn cumulative_balance(rows: &[Transaction], cutoff: Option<NaiveDate>) -> f64 {
    let within = |row: &Transaction| cutoff.map_or(true, |cutoff| row.date <= cutoff);
    let income = kind_total(rows, TransactionKind::Income, |row| {
        within(row) && !is_shared_extra(row)
    });
    let expense = kind_total(rows, TransactionKind::Expense, |row| {
        within(row) && !is_mirrored_extra(row)
    });
    income - expense
}

/// Computes the period summary for a ledger.
pub fn summarize(ledger: &Ledger, filter: PeriodFilter) -> PeriodSummary {
    let rows = ledger.transactions.as_slice();
    let in_period = |row: &Transaction| filter.contains(row.date);

    let prior_balance = prior_balance(rows, filter);
    let period_income = kind_total(rows, TransactionKind::Income, |row| {
        in_period(row) && !is_initial_balance(row)
    });
    let period_expense = kind_total(rows, TransactionKind::Expense, in_period);
    let period_extras = kind_total(rows, TransactionKind::Income, |row| {
        in_period(row) && is_shared_extra(row)
    });
    let operating_income = kind_total(rows, TransactionKind::Income, |row| {
        in_period(row) && !is_initial_balance(row) && !is_pass_through(row)
    });
    let operating_expense = kind_total(rows, TransactionKind::Expense, |row| {
        in_period(row) && !is_pass_through(row)
    });
    let period_net = period_income - period_expense;

    let summary = PeriodSummary {
        filter: Some(filter),
        prior_balance,
        initial_balance: initial_balance(rows),
        period_income,
        period_expense,
        period_net,
        period_result: operating_income - operating_expense,
        period_extras,
        cumulative_balance: cumulative_balance(rows, filter.cutoff()),
        closing_balance: prior_balance + period_net,
    };
    debug!(
        period = %filter.label(),
        rows = rows.len(),
        prior = summary.prior_balance,
        closing = summary.closing_balance,
        "summarized ledger"
    );
    summary
}

/// Rows shown on the dashboard for a period and optional kind.
pub fn filter_rows(
    ledger: &Ledger,
    filter: PeriodFilter,
    kind: Option<TransactionKind>,
) -> Vec<&Transaction> {
    ledger
        .transactions
        .iter()
        .filter(|row| filter.contains(row.date))
        .filter(|row| kind.map_or(true, |kind| row.kind == kind))
        .collect()
}

/// A unit that owes money.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debtor {
    pub unit: String,
    pub outstanding: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DelinquencyReport {
    /// Net debt/recovery balance per unit that has any such rows.
    pub balances: BTreeMap<String, f64>,
    pub debtors: Vec<Debtor>,
    pub total_outstanding: f64,
}

impl DelinquencyReport {
    pub fn debtor(&self, unit: &str) -> Option<&Debtor> {
        self.debtors.iter().find(|debtor| debtor.unit == unit)
    }
}

fn is_debt_or_recovery(row: &Transaction) -> bool {
    row.kind == TransactionKind::Income
        && (row.value < DEBT_THRESHOLD || (row.value > 0.0 && is_adjustment(row)))
}

/// Nets recorded debts against recoveries per unit across the whole history.
pub fn delinquency(ledger: &Ledger) -> DelinquencyReport {
    let mut balances: BTreeMap<String, f64> = BTreeMap::new();
    for row in ledger.transactions.iter().filter(|row| is_debt_or_recovery(row)) {
        *balances.entry(row.unit.clone()).or_default() += row.value;
    }
    let debtors: Vec<Debtor> = balances
        .iter()
        .filter(|(_, balance)| **balance < DEBTOR_THRESHOLD)
        .map(|(unit, balance)| Debtor {
            unit: unit.clone(),
            outstanding: balance.abs(),
        })
        .collect();
    let total_outstanding = debtors.iter().map(|debtor| debtor.outstanding).sum();
    DelinquencyReport {
        balances,
        debtors,
        total_outstanding,
    }
}

/// The recovery row that records a debtor's payment. Debt rows are never touched.
pub fn register_payment(unit: &str, amount: f64, date: NaiveDate) -> Transaction {
    Transaction::income(
        date,
        ADJUSTMENT,
        unit,
        format!("Recovery of arrears - {}", unit),
        amount,
    )
}
