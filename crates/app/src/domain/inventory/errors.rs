//! Inventory service errors.

use granary::ledger::LedgerError;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryServiceError {
    /// The product has no batches at all.
    #[error("no batches available")]
    OutOfStock,

    /// The product's batches cannot cover the requested quantity.
    #[error("insufficient stock, short {shortfall} units")]
    InsufficientStock { shortfall: u64 },

    #[error("batch not found")]
    BatchNotFound,

    /// Stock restoration was requested for an order without items.
    #[error("order has no items")]
    EmptyOrder,

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for InventoryServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::BatchNotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<LedgerError> for InventoryServiceError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::NoBatches => Self::OutOfStock,
            LedgerError::Insufficient { shortfall } => Self::InsufficientStock { shortfall },
        }
    }
}
