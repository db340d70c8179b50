use chrono::NaiveDate;
use tracing::info;

use crate::config::Settings;
use crate::currency::{normalize, RawAmount};
use crate::ledger::{Ledger, PeriodFilter, Transaction, TransactionKind};
use crate::reconcile::{self, DelinquencyReport, PeriodSummary};
use crate::report::{build_report, ReportPayload};

use super::{invalid, ServiceResult};

pub struct SummaryService;

impl SummaryService {
    pub fn summarize(ledger: &Ledger, filter: PeriodFilter) -> PeriodSummary {
        reconcile::summarize(ledger, filter)
    }

    pub fn dashboard_rows(
        ledger: &Ledger,
        filter: PeriodFilter,
        kind: Option<TransactionKind>,
    ) -> Vec<&Transaction> {
        reconcile::filter_rows(ledger, filter, kind)
    }

    pub fn delinquency(ledger: &Ledger) -> DelinquencyReport {
        reconcile::delinquency(ledger)
    }

    /// Records a debtor's payment as a recovery row and returns its id.
    pub fn register_payment(
        ledger: &mut Ledger,
        unit: &str,
        amount: impl Into<RawAmount>,
        date: NaiveDate,
    ) -> ServiceResult<String> {
        let amount = normalize(amount);
        if amount <= 0.0 {
            return invalid("Payment must be greater than zero");
        }
        let report = reconcile::delinquency(ledger);
        let Some(debtor) = report.debtor(unit) else {
            return invalid(format!("`{}` has no outstanding balance", unit));
        };
        let outstanding = debtor.outstanding;
        let id = ledger.add_transaction(reconcile::register_payment(unit, amount, date));
        info!(unit, amount, outstanding, "debtor payment registered");
        Ok(id)
    }

    pub fn report(ledger: &Ledger, filter: PeriodFilter, settings: &Settings) -> ReportPayload {
        build_report(ledger, filter, settings)
    }
}
