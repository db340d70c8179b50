//! Report aggregation: every figure a statement shows, computed once.
//!
//! Renderers only lay the payload out; they never recompute numbers.

mod render;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::currency::{format_currency, LocaleConfig};
use crate::ledger::classifier::{
    extra_display_name, is_adjustment, is_allocation, is_fund, is_initial_balance, RowTags,
};
use crate::ledger::period::month_label;
use crate::ledger::{
    is_shared_extra, ExpenseBucket, Ledger, PeriodFilter, Transaction, TransactionKind,
    UnitGroup, UnitGroups,
};
use crate::reconcile::summarize;

pub use render::{write_report, JsonReportRenderer, ReportRenderer};

/// Paid within this much below the quota still counts as paid in full.
const PAID_IN_FULL_SLACK: f64 = 0.10;
/// Paid more than this above the quota is flagged as carrying adjustments.
const OVERPAID_MARGIN: f64 = 1.00;
const NEGLIGIBLE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub label: String,
    pub amount: f64,
}

impl LineItem {
    fn new(label: impl Into<String>, amount: f64) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Cash that left the building during the period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSection {
    pub water: f64,
    pub electricity: f64,
    pub cleaning: f64,
    /// Other expenses grouped by description.
    pub other: Vec<LineItem>,
    /// Extras paid out, grouped by display name.
    pub mirrored_extras: Vec<LineItem>,
    pub total: f64,
}

/// One line of a group's quota breakdown: `per_unit x units = total`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionLine {
    pub label: String,
    pub per_unit: f64,
    pub units: usize,
    pub total: f64,
}

impl CompositionLine {
    fn new(label: impl Into<String>, total: f64, units: usize) -> Self {
        Self {
            label: label.into(),
            per_unit: total / units as f64,
            units,
            total,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentLine {
    pub unit: String,
    pub description: String,
    pub amount: f64,
}

/// How much of its quota a unit paid during the period.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum UnitPaymentStatus {
    PaidInFull,
    PaidWithAdjustments,
    Partial { short: f64 },
    Open,
}

impl UnitPaymentStatus {
    pub fn derive(quota: f64, paid: f64) -> Self {
        if paid >= quota - PAID_IN_FULL_SLACK {
            if paid > quota + OVERPAID_MARGIN {
                UnitPaymentStatus::PaidWithAdjustments
            } else {
                UnitPaymentStatus::PaidInFull
            }
        } else if paid > 0.0 {
            UnitPaymentStatus::Partial {
                short: quota - paid,
            }
        } else {
            UnitPaymentStatus::Open
        }
    }
}

impl UnitPaymentStatus {
    /// Status text with amounts in `locale`'s currency format.
    pub fn describe(&self, locale: &LocaleConfig) -> String {
        match self {
            UnitPaymentStatus::PaidInFull => "Paid in full".into(),
            UnitPaymentStatus::PaidWithAdjustments => "Paid in full (+ adjustments)".into(),
            UnitPaymentStatus::Partial { short } => {
                format!("Partial (short {})", format_currency(locale, *short))
            }
            UnitPaymentStatus::Open => "Open".into(),
        }
    }
}

impl fmt::Display for UnitPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe(&LocaleConfig::default()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitLine {
    pub unit: String,
    pub paid: f64,
    pub due: f64,
    pub status: UnitPaymentStatus,
    pub status_label: String,
}

/// Collections from one unit group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBlock {
    pub group: UnitGroup,
    pub title: String,
    pub units: usize,
    /// Expected payment per unit for the period.
    pub quota: f64,
    pub composition: Vec<CompositionLine>,
    pub extras: Vec<CompositionLine>,
    pub adjustments: Vec<AdjustmentLine>,
    pub rows: Vec<UnitLine>,
    pub total_collected: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportPayload {
    pub building_name: String,
    pub title: String,
    pub period_label: String,
    /// File name without extension.
    pub file_stem: String,
    pub prior_balance: f64,
    pub expenses: ExpenseSection,
    pub other_income: Vec<LineItem>,
    pub other_income_total: f64,
    pub groups: Vec<GroupBlock>,
    pub period_entries: f64,
    pub period_expenses: f64,
    pub final_balance: f64,
}

impl ReportPayload {
    pub fn group(&self, group: UnitGroup) -> Option<&GroupBlock> {
        self.groups.iter().find(|block| block.group == group)
    }
}

fn title_and_stem(filter: PeriodFilter) -> (String, String) {
    match filter {
        PeriodFilter::All => (
            "General Report - All Periods".to_string(),
            "General_Report_All".to_string(),
        ),
        PeriodFilter::Year(year) => (
            format!("Annual Report - {}", year),
            format!("Annual_Report_{}", year),
        ),
        PeriodFilter::Month { year, month } => (
            format!("Statement of Accounts - {}/{}", month_label(month), year),
            format!("Report_{}_{}", month_label(month), year),
        ),
    }
}

fn grouped<'a, K>(rows: impl Iterator<Item = &'a Transaction>, key: K) -> Vec<LineItem>
where
    K: Fn(&Transaction) -> String,
{
    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(key(row)).or_default() += row.value;
    }
    totals
        .into_iter()
        .map(|(label, amount)| LineItem::new(label, amount))
        .collect()
}

fn expense_section(period: &[&Transaction]) -> ExpenseSection {
    let mut section = ExpenseSection::default();
    let mut other = Vec::new();
    let mut mirrored = Vec::new();
    for row in period.iter().copied().filter(|row| row.is_expense()) {
        match ExpenseBucket::of(row) {
            ExpenseBucket::Water => section.water += row.value,
            ExpenseBucket::Electricity => section.electricity += row.value,
            ExpenseBucket::Cleaning => section.cleaning += row.value,
            ExpenseBucket::MirroredExtra => mirrored.push(row),
            ExpenseBucket::Other => other.push(row),
        }
        section.total += row.value;
    }
    section.other = grouped(other.into_iter(), |row| row.description.trim().to_string());
    section.mirrored_extras = grouped(mirrored.into_iter(), |row| {
        extra_display_name(&row.description)
    });
    section
}

fn is_other_income(row: &Transaction) -> bool {
    row.kind == TransactionKind::Income
        && row.value > NEGLIGIBLE
        && !is_initial_balance(row)
        && !is_allocation(row)
        && !is_fund(row)
        && !is_shared_extra(row)
}

fn group_block(
    group: UnitGroup,
    groups: &UnitGroups,
    period: &[&Transaction],
    expenses: &ExpenseSection,
    locale: &LocaleConfig,
) -> GroupBlock {
    let units = groups.divisor(group);
    let income: Vec<&Transaction> = period
        .iter()
        .copied()
        .filter(|row| row.is_income() && UnitGroup::of(&row.unit) == Some(group))
        .collect();

    let mut composition = vec![CompositionLine::new(
        format!("{:.0}% Water/Sewage", group.water_share() * 100.0),
        expenses.water * group.water_share(),
        units,
    )];
    if group.pays_electricity_and_cleaning() {
        composition.push(CompositionLine::new(
            "Electricity (common area)",
            expenses.electricity,
            units,
        ));
        composition.push(CompositionLine::new(
            "Building cleaning",
            expenses.cleaning,
            units,
        ));
    }
    let fund_received: f64 = income.iter().filter(|row| is_fund(row)).map(|row| row.value).sum();
    if fund_received > 0.0 {
        composition.push(CompositionLine::new("Reserve fund", fund_received, units));
    }

    let extras: Vec<CompositionLine> = grouped(
        income.iter().copied().filter(|row| RowTags::of(row).is_unit_extra()),
        |row| extra_display_name(&row.description),
    )
    .into_iter()
    .map(|item| CompositionLine::new(item.label, item.amount, units))
    .collect();

    let adjustments: Vec<AdjustmentLine> = income
        .iter()
        .filter(|row| is_adjustment(row) && row.value.abs() > NEGLIGIBLE)
        .map(|row| AdjustmentLine {
            unit: row.unit.clone(),
            description: row.description.clone(),
            amount: row.value,
        })
        .collect();

    let quota: f64 = composition.iter().map(|line| line.per_unit).sum::<f64>()
        + extras.iter().map(|line| line.per_unit).sum::<f64>();

    let rows = groups
        .members(group)
        .iter()
        .map(|unit| {
            let paid: f64 = income
                .iter()
                .filter(|row| row.unit == *unit)
                .map(|row| row.value)
                .sum();
            let status = UnitPaymentStatus::derive(quota, paid);
            UnitLine {
                unit: unit.clone(),
                paid,
                due: quota,
                status,
                status_label: status.describe(locale),
            }
        })
        .collect();

    GroupBlock {
        group,
        title: format!("Collections: {}", group.label()),
        units,
        quota,
        composition,
        extras,
        adjustments,
        rows,
        total_collected: income.iter().map(|row| row.value).sum(),
    }
}

/// Assembles the statement for one period, headed and formatted per `settings`.
pub fn build_report(ledger: &Ledger, filter: PeriodFilter, settings: &Settings) -> ReportPayload {
    let summary = summarize(ledger, filter);
    let groups = ledger.unit_groups();
    let period: Vec<&Transaction> = ledger
        .transactions
        .iter()
        .filter(|row| filter.contains(row.date))
        .collect();

    let expenses = expense_section(&period);
    let other_income_rows: Vec<&Transaction> =
        period.iter().copied().filter(|row| is_other_income(row)).collect();
    let other_income_total = other_income_rows.iter().map(|row| row.value).sum();
    let other_income = grouped(other_income_rows.into_iter(), |row| {
        row.description.trim().to_string()
    });

    let blocks = [UnitGroup::Rooms, UnitGroup::Apartments]
        .into_iter()
        .map(|group| group_block(group, &groups, &period, &expenses, &settings.locale))
        .collect();

    let (title, file_stem) = title_and_stem(filter);
    let period_expenses = expenses.total;
    let payload = ReportPayload {
        building_name: settings.building_name.clone(),
        title,
        period_label: filter.label(),
        file_stem,
        prior_balance: summary.prior_balance,
        expenses,
        other_income,
        other_income_total,
        groups: blocks,
        period_entries: summary.period_income,
        period_expenses,
        final_balance: summary.prior_balance + summary.period_income - period_expenses,
    };
    debug!(
        report = %payload.file_stem,
        rows = period.len(),
        final_balance = payload.final_balance,
        "built report payload"
    );
    payload
}
