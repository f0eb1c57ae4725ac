//! # stockpilot-jobs
//!
//! Scheduled maintenance work, invoked by cron through the function
//! endpoints or from the command line:
//! - [`cleanup`] purges expired generations and their stored files
//! - [`credit_reset`] tops daily-reset subscriptions back up to their plan allotment
//!
//! Both jobs talk to the outside world only through the traits in [`store`],
//! so they run the same against PostgreSQL/S3 and in-memory fakes.

pub mod cleanup;
pub mod credit_reset;
pub mod store;

pub use cleanup::CleanupReport;
pub use credit_reset::CreditResetReport;
pub use store::{CreditLedger, GenerationStore, ObjectStore};

use stockpilot_common::error::StockpilotError;

/// A job step failure that aborts the run. Per-item failures are logged and
/// counted instead.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Failed to list expired generations: {0}")]
    ListExpired(#[source] anyhow::Error),

    #[error("Failed to delete generations: {0}")]
    DeleteGenerations(#[source] anyhow::Error),

    #[error("Failed to list daily-reset plans: {0}")]
    ListPlans(#[source] anyhow::Error),
}

impl From<JobError> for StockpilotError {
    fn from(err: JobError) -> Self {
        StockpilotError::Internal(anyhow::Error::new(err))
    }
}
