mod common;

use common::{approx, date, setup_test_env};
use condo_ledger::billing::{ExtraCharge, ExtraTarget, PreviewEdit};
use condo_ledger::core::services::{BillingRequest, BillingService};
use condo_ledger::core::CondoManager;
use condo_ledger::currency::RawAmount;
use condo_ledger::ledger::{PeriodFilter, UnitGroup};
use condo_ledger::report::{JsonReportRenderer, ReportPayload, UnitPaymentStatus};

fn june_billed_manager() -> CondoManager {
    let (mut manager, _config, _base) = setup_test_env();
    manager.load();
    manager
        .save_config(common::small_building())
        .expect("save units");
    let run = BillingService::prepare(
        &manager.current,
        BillingRequest {
            reference_date: Some(date(2024, 6, 10)),
            water: RawAmount::Number(1000.0),
            electricity: RawAmount::Number(200.0),
            cleaning: RawAmount::Number(100.0),
            fund_per_unit: RawAmount::Number(50.0),
            extras: vec![ExtraCharge::new("Roof repair", 600.0, ExtraTarget::All)],
        },
    )
    .expect("valid request");
    let run = BillingService::apply_edits(
        run,
        &[
            PreviewEdit::paid("Room 02", 200.0),
            PreviewEdit::paid("Apartment 102", 700.0),
        ],
    );
    manager.commit_billing(&run).expect("commit");
    manager
}

#[test]
fn expense_section_lists_bills_and_mirrored_extras() {
    let manager = june_billed_manager();
    let report = manager.report(PeriodFilter::month(2024, 6));
    assert_eq!(report.file_stem, "Report_Jun_2024");
    assert_eq!(report.building_name, "San Rafael Building");
    approx(report.expenses.water, 1000.0);
    approx(report.expenses.electricity, 200.0);
    approx(report.expenses.cleaning, 100.0);
    assert!(report.expenses.other.is_empty());
    assert_eq!(report.expenses.mirrored_extras.len(), 1);
    assert_eq!(report.expenses.mirrored_extras[0].label, "Roof repair");
    approx(report.expenses.mirrored_extras[0].amount, 600.0);
    approx(report.expenses.total, 1900.0);
    assert!(report.other_income.is_empty());
}

#[test]
fn group_blocks_show_quota_and_unit_statuses() {
    let manager = june_billed_manager();
    let report = manager.report(PeriodFilter::month(2024, 6));

    let rooms = report.group(UnitGroup::Rooms).unwrap();
    approx(rooms.quota, 175.0 + 50.0 + 150.0);
    assert_eq!(rooms.extras.len(), 1);
    approx(rooms.extras[0].per_unit, 150.0);
    assert_eq!(rooms.rows[0].status, UnitPaymentStatus::PaidInFull);
    approx(rooms.rows[1].paid, 200.0);
    assert_eq!(rooms.rows[1].status.to_string(), "Partial (short R$ 175,00)");
    assert_eq!(rooms.adjustments.len(), 1);
    approx(rooms.total_collected, 575.0);

    let apartments = report.group(UnitGroup::Apartments).unwrap();
    approx(apartments.quota, 325.0 + 100.0 + 50.0 + 50.0 + 150.0);
    assert_eq!(apartments.composition.len(), 4);
    assert_eq!(apartments.rows[0].status, UnitPaymentStatus::PaidInFull);
    assert_eq!(
        apartments.rows[1].status,
        UnitPaymentStatus::PaidWithAdjustments
    );
}

#[test]
fn cash_summary_carries_into_next_month() {
    let manager = june_billed_manager();
    let june = manager.report(PeriodFilter::month(2024, 6));
    let paid = 375.0 + 200.0 + 675.0 + 700.0;
    approx(june.prior_balance, 0.0);
    approx(june.period_entries, paid);
    approx(june.period_expenses, 1900.0);
    approx(june.final_balance, paid - 1900.0);
    approx(manager.summary(PeriodFilter::month(2024, 6)).closing_balance, june.final_balance);

    let july = manager.report(PeriodFilter::month(2024, 7));
    approx(july.prior_balance, june.final_balance);
    approx(july.final_balance, june.final_balance);
}

#[test]
fn rendered_report_matches_payload() {
    let manager = june_billed_manager();
    let dir = common::temp_base().join("reports");
    let path = manager
        .write_report(PeriodFilter::Year(2024), &JsonReportRenderer::pretty(), &dir)
        .expect("write report");
    assert!(path.ends_with("Annual_Report_2024.json"));
    let payload: ReportPayload =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(payload, manager.report(PeriodFilter::Year(2024)));
}
