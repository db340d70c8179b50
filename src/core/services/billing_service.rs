use chrono::NaiveDate;
use tracing::{info, warn};

use crate::billing::{
    commit, compute_billing, recompute, BillingInputs, BillingRun, ExtraCharge, PreviewEdit,
    UtilityTotals,
};
use crate::currency::{normalize, RawAmount};
use crate::ledger::Ledger;

use super::{invalid, ServiceResult};

/// Billing form values as typed by the operator.
#[derive(Debug, Clone, Default)]
pub struct BillingRequest {
    pub reference_date: Option<NaiveDate>,
    pub water: RawAmount,
    pub electricity: RawAmount,
    pub cleaning: RawAmount,
    pub fund_per_unit: RawAmount,
    pub extras: Vec<ExtraCharge>,
}

pub struct BillingService;

impl BillingService {
    /// Validates the form and computes a run over the ledger's configured units.
    pub fn prepare(ledger: &Ledger, request: BillingRequest) -> ServiceResult<BillingRun> {
        let Some(reference_date) = request.reference_date else {
            return invalid("Reference date is required");
        };
        let utilities = UtilityTotals::new(
            normalize(request.water),
            normalize(request.electricity),
            normalize(request.cleaning),
        );
        let fund_per_unit = normalize(request.fund_per_unit);
        if [utilities.water, utilities.electricity, utilities.cleaning, fund_per_unit]
            .iter()
            .any(|amount| *amount < 0.0)
        {
            return invalid("Bills and fund must not be negative");
        }

        let mut extras = Vec::with_capacity(request.extras.len());
        for mut extra in request.extras {
            extra.amount = normalize(extra.amount);
            if extra.description.trim().is_empty() {
                if extra.amount == 0.0 {
                    continue;
                }
                return invalid("Extra charge needs a description");
            }
            if extra.amount <= 0.0 {
                return invalid(format!(
                    "Extra charge `{}` must have a positive amount",
                    extra.description.trim()
                ));
            }
            extras.push(extra);
        }

        let groups = ledger.unit_groups();
        if groups.rooms.is_empty() && groups.apartments.is_empty() {
            warn!("no billable units configured; run has no unit rows");
        }
        Ok(compute_billing(
            BillingInputs {
                reference_date,
                utilities,
                fund_per_unit,
                extras,
            },
            &groups,
        ))
    }

    pub fn apply_edits(run: BillingRun, edits: &[PreviewEdit]) -> BillingRun {
        recompute(run, edits)
    }

    /// Appends the run's rows to the ledger and returns how many were added.
    pub fn commit(ledger: &mut Ledger, run: &BillingRun) -> usize {
        let added = ledger.extend(commit(run));
        info!(added, total = ledger.transaction_count(), "billing appended to ledger");
        added
    }
}
