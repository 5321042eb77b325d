//! Orders service errors.

use jiff::civil::Date;
use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use harvest::{commission::CommissionError, status::InvalidTransition};

use crate::domain::{
    carts::pricing::CartPricingError,
    identity::{errors::AccessError, models::ProducerUuid},
    products::models::ProductUuid,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    /// Checkout was attempted with no lines in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// A resolved delivery date is inside the minimum lead time.
    #[error(
        "delivery for producer {producer} requested on {requested} is before the earliest allowed date {earliest}"
    )]
    InvalidDeliveryDate {
        producer: ProducerUuid,
        requested: Date,
        earliest: Date,
    },

    /// A stock decrement would have taken a product below zero.
    #[error("insufficient stock for product {product}")]
    InsufficientStock { product: ProductUuid },

    /// A cart line's product has no producer to pay out to.
    #[error("product {product} has no assigned producer")]
    UnassignedProducer { product: ProductUuid },

    /// Commission policy misconfiguration; requires administrator
    /// intervention rather than a checkout retry.
    #[error(transparent)]
    Commission(#[from] CommissionError),

    /// The status flow forbids the requested transition.
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),

    /// The actor lacks the capability for this operation.
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("order not found")]
    NotFound,

    #[error("related resource not found")]
    InvalidReference,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
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

impl From<CartPricingError> for OrdersServiceError {
    fn from(error: CartPricingError) -> Self {
        match error {
            CartPricingError::UnassignedProducer(product) => Self::UnassignedProducer { product },
        }
    }
}
