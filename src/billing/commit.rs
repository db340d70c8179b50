use tracing::info;

use crate::ledger::category::{
    ADJUSTMENT, ALLOCATION, CLEANING_PAYMENT, CONDOMINIUM_UNIT, CONSTRUCTION, ELECTRICITY_PAYMENT,
    EXTRA_CHARGE, RESERVE_FUND, WATER_PAYMENT,
};
use crate::ledger::Transaction;

use super::{BillingRun, PAYMENT_TOLERANCE};

const SHORT_PAYMENT_DESCRIPTION: &str = "Outstanding balance (short)";
const SURPLUS_DESCRIPTION: &str = "Payment surplus";

/// Converts a confirmed run into the rows to append to the ledger.
///
/// Zero-valued shares produce no rows. Every extra is booked twice: as
/// per-unit income and as one building expense for its full amount.
pub fn commit(run: &BillingRun) -> Vec<Transaction> {
    let date = run.reference_date();
    let mut batch = Vec::new();

    for row in &run.rows {
        let status = row.status.to_string();
        let unit = row.unit.as_str();
        let income = |category: &str, description: &str, value: f64| {
            Transaction::income(date, category, unit, description, value).with_status(status.clone())
        };

        if row.allocation > 0.0 {
            batch.push(income(ALLOCATION, "Allocation", row.allocation));
        }
        if row.fund > 0.0 {
            batch.push(income(RESERVE_FUND, "Reserve fund", row.fund));
        }
        for extra in &run.inputs.extras {
            let share = extra.per_unit(row.group, &run.groups);
            if share > 0.0 {
                batch.push(income(EXTRA_CHARGE, &extra.ledger_description(), share));
            }
        }
        if row.adjustment != 0.0 {
            batch.push(income(ADJUSTMENT, "Manual adjustment", row.adjustment));
        }
        let difference = row.amount_paid - row.total_due;
        if difference.abs() > PAYMENT_TOLERANCE {
            let description = if difference < 0.0 {
                SHORT_PAYMENT_DESCRIPTION
            } else {
                SURPLUS_DESCRIPTION
            };
            batch.push(income(ADJUSTMENT, description, difference));
        }
    }

    let utilities = run.inputs.utilities;
    for (category, description, total) in [
        (WATER_PAYMENT, "Water bill", utilities.water),
        (ELECTRICITY_PAYMENT, "Electricity bill", utilities.electricity),
        (CLEANING_PAYMENT, "Building cleaning", utilities.cleaning),
    ] {
        if total > 0.0 {
            batch.push(Transaction::expense(date, category, CONDOMINIUM_UNIT, description, total));
        }
    }

    for extra in &run.inputs.extras {
        if extra.amount > 0.0 {
            batch.push(Transaction::expense(
                date,
                CONSTRUCTION,
                CONDOMINIUM_UNIT,
                extra.ledger_description(),
                extra.amount,
            ));
        }
    }

    info!(
        date = %date,
        units = run.rows.len(),
        rows = batch.len(),
        "committed billing run"
    );
    batch
}
