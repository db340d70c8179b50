pub mod billing_service;
pub mod entry_service;
pub mod summary_service;

pub use billing_service::{BillingRequest, BillingService};
pub use entry_service::{EntryService, NewEntry};
pub use summary_service::SummaryService;

use tracing::warn;

use crate::errors::LedgerError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error("{0}")]
    Invalid(String),
}

/// Rejects user input with a warning-level log entry.
pub(crate) fn invalid<T>(message: impl Into<String>) -> ServiceResult<T> {
    let message = message.into();
    warn!(reason = %message, "rejected input");
    Err(ServiceError::Invalid(message))
}
