//! Allocation engine: turns utility bills, the reserve fund and ad hoc extras
//! into per-unit dues, and a confirmed run into ledger rows.
//!
//! A [`BillingRun`] is a plain value. Callers drive the editing loop by
//! feeding [`PreviewEdit`]s to [`recompute`] and finally hand the run to
//! [`commit`].

mod commit;

pub use commit::commit;

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::currency::{format_plain, normalize, RawAmount};
use crate::ledger::{UnitGroup, UnitGroups};

/// Paid and due amounts closer than this are considered equal.
pub const PAYMENT_TOLERANCE: f64 = 0.01;

/// Which units share an extra charge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ExtraTarget {
    #[default]
    All,
    RoomsOnly,
    ApartmentsOnly,
}

impl ExtraTarget {
    /// Parses a target label; legacy Portuguese labels are accepted.
    pub fn parse(label: &str) -> Option<Self> {
        let lowered = label.trim().to_lowercase();
        if lowered.contains("all") || lowered.contains("todos") {
            Some(ExtraTarget::All)
        } else if lowered.contains("room") || lowered.contains("sala") {
            Some(ExtraTarget::RoomsOnly)
        } else if lowered.contains("apartment") || lowered.contains("apto") {
            Some(ExtraTarget::ApartmentsOnly)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExtraTarget::All => "All",
            ExtraTarget::RoomsOnly => "Rooms only",
            ExtraTarget::ApartmentsOnly => "Apartments only",
        }
    }

    pub fn applies_to(&self, group: UnitGroup) -> bool {
        match self {
            ExtraTarget::All => true,
            ExtraTarget::RoomsOnly => group == UnitGroup::Rooms,
            ExtraTarget::ApartmentsOnly => group == UnitGroup::Apartments,
        }
    }

    pub fn divisor(&self, groups: &UnitGroups) -> usize {
        match self {
            ExtraTarget::All => groups.total_divisor(),
            ExtraTarget::RoomsOnly => groups.divisor(UnitGroup::Rooms),
            ExtraTarget::ApartmentsOnly => groups.divisor(UnitGroup::Apartments),
        }
    }
}

/// One ad hoc charge line of a billing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtraCharge {
    pub description: String,
    pub amount: f64,
    #[serde(default)]
    pub target: ExtraTarget,
}

impl ExtraCharge {
    /// Builds a charge line; the amount goes through [`normalize`].
    pub fn new(
        description: impl Into<String>,
        amount: impl Into<RawAmount>,
        target: ExtraTarget,
    ) -> Self {
        Self {
            description: description.into(),
            amount: normalize(amount),
            target,
        }
    }

    /// What one unit of `group` owes for this charge.
    pub fn per_unit(&self, group: UnitGroup, groups: &UnitGroups) -> f64 {
        if !self.target.applies_to(group) || !self.amount.is_finite() {
            return 0.0;
        }
        self.amount / self.target.divisor(groups) as f64
    }

    /// Description used for the rows this charge produces, e.g. `Roof (All)`.
    pub fn ledger_description(&self) -> String {
        format!("{} ({})", self.description.trim(), self.target.label())
    }
}

/// Building-wide bills for the period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct UtilityTotals {
    pub water: f64,
    pub electricity: f64,
    pub cleaning: f64,
}

impl UtilityTotals {
    pub fn new(water: f64, electricity: f64, cleaning: f64) -> Self {
        Self {
            water,
            electricity,
            cleaning,
        }
    }

    /// The group's portion of the bills before splitting across units.
    pub fn group_amount(&self, group: UnitGroup) -> f64 {
        let mut amount = self.water * group.water_share();
        if group.pays_electricity_and_cleaning() {
            amount += self.electricity + self.cleaning;
        }
        amount
    }
}

/// Everything the operator enters to start a billing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingInputs {
    pub reference_date: NaiveDate,
    pub utilities: UtilityTotals,
    pub fund_per_unit: f64,
    #[serde(default)]
    pub extras: Vec<ExtraCharge>,
}

/// Per-unit base shares of one group.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupShares {
    pub allocation: f64,
    pub fund: f64,
    pub extras: f64,
}

impl GroupShares {
    pub fn base(&self) -> f64 {
        self.allocation + self.fund + self.extras
    }
}

/// Payment completeness of a preview row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PaymentStatus {
    Ok,
    Pending { short: f64 },
    Surplus { surplus: f64 },
}

impl PaymentStatus {
    pub fn derive(due: f64, paid: f64) -> Self {
        let difference = paid - due;
        if difference.abs() <= PAYMENT_TOLERANCE {
            PaymentStatus::Ok
        } else if difference < 0.0 {
            PaymentStatus::Pending { short: -difference }
        } else {
            PaymentStatus::Surplus {
                surplus: difference,
            }
        }
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self, PaymentStatus::Pending { .. })
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentStatus::Ok => write!(f, "Ok"),
            PaymentStatus::Pending { short } => {
                write!(f, "Pending (short by {})", format_plain(*short))
            }
            PaymentStatus::Surplus { surplus } => {
                write!(f, "Ok (+ {} surplus)", format_plain(*surplus))
            }
        }
    }
}

/// One unit's line in the billing preview.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreviewRow {
    pub unit: String,
    pub group: UnitGroup,
    pub allocation: f64,
    pub fund: f64,
    pub extras: f64,
    pub adjustment: f64,
    pub total_due: f64,
    pub amount_paid: f64,
    pub status: PaymentStatus,
}

impl PreviewRow {
    pub fn base(&self) -> f64 {
        self.allocation + self.fund + self.extras
    }
}

/// A user edit to one preview row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PreviewEdit {
    pub unit: String,
    pub adjustment: Option<f64>,
    pub amount_paid: Option<f64>,
}

impl PreviewEdit {
    pub fn adjustment(unit: impl Into<String>, adjustment: f64) -> Self {
        Self {
            unit: unit.into(),
            adjustment: Some(adjustment),
            amount_paid: None,
        }
    }

    pub fn paid(unit: impl Into<String>, amount_paid: f64) -> Self {
        Self {
            unit: unit.into(),
            adjustment: None,
            amount_paid: Some(amount_paid),
        }
    }
}

/// A computed, unconfirmed proposal of a period's charges.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BillingRun {
    pub inputs: BillingInputs,
    pub groups: UnitGroups,
    pub room_shares: GroupShares,
    pub apartment_shares: GroupShares,
    pub rows: Vec<PreviewRow>,
}

impl BillingRun {
    pub fn reference_date(&self) -> NaiveDate {
        self.inputs.reference_date
    }

    pub fn shares(&self, group: UnitGroup) -> GroupShares {
        match group {
            UnitGroup::Rooms => self.room_shares,
            UnitGroup::Apartments => self.apartment_shares,
        }
    }

    pub fn row(&self, unit: &str) -> Option<&PreviewRow> {
        self.rows.iter().find(|row| row.unit == unit)
    }

    pub fn total_due(&self) -> f64 {
        self.rows.iter().map(|row| row.total_due).sum()
    }
}

fn group_shares(inputs: &BillingInputs, groups: &UnitGroups, group: UnitGroup) -> GroupShares {
    let divisor = groups.divisor(group) as f64;
    GroupShares {
        allocation: inputs.utilities.group_amount(group) / divisor,
        fund: inputs.fund_per_unit,
        extras: inputs
            .extras
            .iter()
            .map(|extra| extra.per_unit(group, groups))
            .sum(),
    }
}

/// Computes the shares for every billable unit. Every row starts fully paid.
pub fn compute_billing(inputs: BillingInputs, groups: &UnitGroups) -> BillingRun {
    let room_shares = group_shares(&inputs, groups, UnitGroup::Rooms);
    let apartment_shares = group_shares(&inputs, groups, UnitGroup::Apartments);

    let rows = groups
        .billable()
        .map(|(group, unit)| {
            let shares = match group {
                UnitGroup::Rooms => room_shares,
                UnitGroup::Apartments => apartment_shares,
            };
            let due = shares.base();
            PreviewRow {
                unit: unit.to_string(),
                group,
                allocation: shares.allocation,
                fund: shares.fund,
                extras: shares.extras,
                adjustment: 0.0,
                total_due: due,
                amount_paid: due,
                status: PaymentStatus::Ok,
            }
        })
        .collect::<Vec<_>>();

    debug!(
        units = rows.len(),
        room_base = room_shares.base(),
        apartment_base = apartment_shares.base(),
        "computed billing run"
    );

    BillingRun {
        inputs,
        groups: groups.clone(),
        room_shares,
        apartment_shares,
        rows,
    }
}

/// Applies preview edits and rederives dues and statuses.
///
/// When an edit changes a row's due, the paid amount follows the new due
/// unless the same edit also sets it.
pub fn recompute(mut run: BillingRun, edits: &[PreviewEdit]) -> BillingRun {
    for edit in edits {
        let Some(row) = run.rows.iter_mut().find(|row| row.unit == edit.unit) else {
            debug!(unit = %edit.unit, "ignoring edit for unit outside the run");
            continue;
        };
        if let Some(adjustment) = edit.adjustment {
            row.adjustment = adjustment;
        }
        let new_due = row.base() + row.adjustment;
        if (row.total_due - new_due).abs() > PAYMENT_TOLERANCE {
            row.total_due = new_due;
            row.amount_paid = new_due;
        }
        if let Some(paid) = edit.amount_paid {
            row.amount_paid = paid;
        }
    }
    for row in run.rows.iter_mut() {
        row.status = PaymentStatus::derive(row.total_due, row.amount_paid);
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> UnitGroups {
        UnitGroups::from_units(["Room 01", "Room 02", "Apartment 101", "Apartment 102"])
    }

    fn inputs(extras: Vec<ExtraCharge>) -> BillingInputs {
        BillingInputs {
            reference_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            utilities: UtilityTotals::new(1000.0, 200.0, 100.0),
            fund_per_unit: 50.0,
            extras,
        }
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn splits_utilities_between_groups() {
        let run = compute_billing(inputs(Vec::new()), &groups());
        let room = run.row("Room 01").unwrap();
        let apartment = run.row("Apartment 101").unwrap();
        assert!(approx(room.total_due, 1000.0 * 0.35 / 2.0 + 50.0));
        assert!(approx(room.total_due, 225.0));
        assert!(approx(apartment.total_due, (1000.0 * 0.65 + 200.0 + 100.0) / 2.0 + 50.0));
        assert!(approx(apartment.total_due, 525.0));
        assert_eq!(room.amount_paid, room.total_due);
        assert_eq!(room.status, PaymentStatus::Ok);
    }

    #[test]
    fn extras_split_by_target() {
        let extras = vec![
            ExtraCharge::new("Roof", 600.0, ExtraTarget::All),
            ExtraCharge::new("Gate", 100.0, ExtraTarget::RoomsOnly),
            ExtraCharge::new("Paint", 300.0, ExtraTarget::ApartmentsOnly),
        ];
        let run = compute_billing(inputs(extras), &groups());
        assert!(approx(run.room_shares.extras, 150.0 + 50.0));
        assert!(approx(run.apartment_shares.extras, 150.0 + 150.0));
    }

    #[test]
    fn non_finite_extra_contributes_nothing() {
        let mut roof = ExtraCharge::new("Roof", "1.200,00", ExtraTarget::All);
        assert!(approx(roof.per_unit(UnitGroup::Rooms, &groups()), 300.0));
        roof.amount = f64::NAN;
        let run = compute_billing(inputs(vec![roof]), &groups());
        assert!(approx(run.row("Room 01").unwrap().total_due, 225.0));
        assert!(run.rows.iter().all(|row| row.total_due.is_finite()));
    }

    #[test]
    fn empty_group_still_divides_by_one() {
        let groups = UnitGroups::from_units(["Apartment 101"]);
        let run = compute_billing(inputs(vec![ExtraCharge::new("Roof", 100.0, ExtraTarget::All)]), &groups);
        assert_eq!(run.rows.len(), 1);
        assert!(approx(run.room_shares.allocation, 350.0));
        assert!(approx(run.apartment_shares.extras, 50.0));
    }

    #[test]
    fn ungrouped_units_get_no_rows() {
        let groups = UnitGroups::from_units(["Garage", "Room 01"]);
        let run = compute_billing(inputs(Vec::new()), &groups);
        assert_eq!(run.rows.len(), 1);
        assert!(run.row("Garage").is_none());
    }

    #[test]
    fn status_labels() {
        assert_eq!(PaymentStatus::derive(500.0, 480.0).to_string(), "Pending (short by R$ 20.00)");
        assert_eq!(PaymentStatus::derive(500.0, 500.0).to_string(), "Ok");
        assert_eq!(PaymentStatus::derive(500.0, 500.005).to_string(), "Ok");
        assert_eq!(PaymentStatus::derive(500.0, 520.0).to_string(), "Ok (+ R$ 20.00 surplus)");
    }

    #[test]
    fn adjustment_moves_due_and_paid() {
        let run = compute_billing(inputs(Vec::new()), &groups());
        let run = recompute(run, &[PreviewEdit::adjustment("Room 01", 10.0)]);
        let row = run.row("Room 01").unwrap();
        assert!(approx(row.total_due, 235.0));
        assert!(approx(row.amount_paid, 235.0));
        assert_eq!(row.status, PaymentStatus::Ok);
    }

    #[test]
    fn paid_override_derives_pending() {
        let run = compute_billing(inputs(Vec::new()), &groups());
        let run = recompute(run, &[PreviewEdit::paid("Apartment 101", 500.0)]);
        let row = run.row("Apartment 101").unwrap();
        assert!(approx(row.total_due, 525.0));
        assert_eq!(row.status.to_string(), "Pending (short by R$ 25.00)");
        assert!(!row.status.is_settled());
    }

    #[test]
    fn adjustment_and_paid_in_one_edit() {
        let run = compute_billing(inputs(Vec::new()), &groups());
        let edit = PreviewEdit {
            unit: "Room 02".into(),
            adjustment: Some(-25.0),
            amount_paid: Some(250.0),
        };
        let run = recompute(run, &[edit]);
        let row = run.row("Room 02").unwrap();
        assert!(approx(row.total_due, 200.0));
        assert_eq!(row.status.to_string(), "Ok (+ R$ 50.00 surplus)");
    }

    #[test]
    fn recompute_is_pure_for_no_edits() {
        let run = compute_billing(inputs(Vec::new()), &groups());
        let again = recompute(run.clone(), &[]);
        assert_eq!(run, again);
    }

    #[test]
    fn target_parsing() {
        assert_eq!(ExtraTarget::parse("All"), Some(ExtraTarget::All));
        assert_eq!(ExtraTarget::parse("Só Salas"), Some(ExtraTarget::RoomsOnly));
        assert_eq!(ExtraTarget::parse("apartments only"), Some(ExtraTarget::ApartmentsOnly));
        assert_eq!(ExtraTarget::parse("nobody"), None);
    }
}
