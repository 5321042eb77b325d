//! Settlements service errors.

use jiff::civil::Date;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettlementsServiceError {
    /// The period ends before it starts.
    #[error("settlement period {start} to {end} is inverted")]
    InvalidPeriod { start: Date, end: Date },

    /// The settlement has already been paid out.
    #[error("settlement is already paid")]
    AlreadyPaid,

    #[error("settlement not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for SettlementsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            _ => Self::Sql(error),
        }
    }
}
