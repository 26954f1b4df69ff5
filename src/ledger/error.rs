//! Ledger error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    /// Input rejected before any persistence call.
    #[error("{0}")]
    Validation(String),
    #[error("Missing parcel not found: {0}")]
    NotFound(i32),
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
}

impl LedgerError {
    /// Map a storage error for a single-row operation, turning a missing row
    /// into `NotFound`.
    pub(crate) fn for_row(id: i32, e: diesel::result::Error) -> Self {
        match e {
            diesel::result::Error::NotFound => LedgerError::NotFound(id),
            other => LedgerError::Database(other),
        }
    }
}
