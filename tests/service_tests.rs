mod common;

use common::{approx, date, empty_ledger, setup_test_env};
use condo_ledger::core::services::{
    EntryService, NewEntry, ServiceError, SummaryService,
};
use condo_ledger::core::CondoManager;
use condo_ledger::currency::RawAmount;
use condo_ledger::ledger::category::{ADJUSTMENT, BUILDING_GENERAL_UNIT};
use condo_ledger::ledger::{PeriodFilter, Transaction, TransactionKind};
use condo_ledger::storage::MemoryStore;

fn lamp(amount: RawAmount) -> NewEntry {
    NewEntry {
        date: date(2024, 3, 3),
        kind: TransactionKind::Expense,
        category: "Maintenance".into(),
        unit: None,
        description: "Hallway lamp".into(),
        amount,
    }
}

#[test]
fn rejected_entry_is_not_saved() {
    let (mut manager, _config, _base) = setup_test_env();
    manager.load();
    let err = manager
        .add_entry(lamp(RawAmount::Text("zero".into())))
        .expect_err("unparsable amount");
    assert!(matches!(err, ServiceError::Invalid(_)));
    assert!(manager.storage().read_transactions().unwrap().is_empty());

    let id = manager.add_entry(lamp(RawAmount::Text("35,90".into()))).unwrap();
    let stored = manager.storage().read_transactions().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, id);
    assert_eq!(stored[0].unit, BUILDING_GENERAL_UNIT);
    approx(stored[0].value, 35.9);
}

#[test]
fn debtor_payment_flow_through_the_manager() {
    let store = MemoryStore::with_rows(
        vec![Transaction::income(
            date(2024, 1, 10),
            ADJUSTMENT,
            "Room 02",
            "Outstanding balance (short)",
            -150.0,
        )],
        common::small_building(),
    );
    let mut manager = CondoManager::new(Box::new(store), common::default_settings());
    manager.load();

    let debtors = SummaryService::delinquency(&manager.current);
    assert_eq!(debtors.debtors.len(), 1);
    approx(debtors.total_outstanding, 150.0);

    manager
        .register_payment("Room 02", 150.0, date(2024, 2, 1))
        .expect("register payment");
    assert!(SummaryService::delinquency(&manager.current).debtors.is_empty());
    assert_eq!(manager.storage().read_transactions().unwrap().len(), 2);

    let err = manager
        .register_payment("Room 02", 10.0, date(2024, 2, 2))
        .expect_err("no longer a debtor");
    assert!(matches!(err, ServiceError::Invalid(_)));
}

#[test]
fn edited_view_is_merged_and_saved() {
    let (mut manager, _config, _base) = setup_test_env();
    manager.load();
    for day in 1..=3 {
        manager.current.add_transaction(Transaction::expense(
            date(2024, 5, day),
            "Maintenance",
            BUILDING_GENERAL_UNIT,
            format!("Repair {}", day),
            10.0,
        ));
    }
    manager.save().unwrap();

    let visible: Vec<String> = SummaryService::dashboard_rows(
        &manager.current,
        PeriodFilter::month(2024, 5),
        Some(TransactionKind::Expense),
    )
    .into_iter()
    .map(|row| row.id.clone())
    .collect();
    assert_eq!(visible.len(), 3);

    let mut kept = manager.current.transaction(&visible[0]).unwrap().clone();
    kept.value = 12.0;
    manager.save_edits(&visible, vec![kept]).unwrap();

    let stored = manager.storage().read_transactions().unwrap();
    assert_eq!(stored.len(), 1);
    approx(stored[0].value, 12.0);
}

#[test]
fn initial_balance_shows_as_prior_balance() {
    let mut ledger = empty_ledger();
    EntryService::set_initial_balance(&mut ledger, date(2023, 12, 31), 1000.0).unwrap();
    let summary = SummaryService::summarize(&ledger, PeriodFilter::month(2024, 1));
    approx(summary.prior_balance, 1000.0);
    approx(summary.period_income, 0.0);
}

#[test]
fn unreachable_store_still_yields_a_dashboard() {
    let mut manager = CondoManager::new(Box::new(MemoryStore::offline()), common::default_settings());
    let outcome = manager.load();
    assert_eq!(outcome.warnings.len(), 2);
    let summary = manager.summary(PeriodFilter::Year(2024));
    approx(summary.cumulative_balance, 0.0);
    assert!(manager.save().is_err());
}
