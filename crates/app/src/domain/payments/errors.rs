//! Payments service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use harvest::commission::CommissionError;

use crate::domain::payments::gateway::GatewayError;

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    /// The gateway declined the payment. The failed transaction row is
    /// still committed for audit.
    #[error("payment declined by gateway {gateway}")]
    Declined { gateway: String },

    /// A policy with the same start date already exists.
    #[error("commission policy already exists")]
    AlreadyExists,

    /// The gateway could not be reached or returned garbage.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Commission(#[from] CommissionError),

    #[error("payment transaction not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for PaymentsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            _ => Self::Sql(error),
        }
    }
}
