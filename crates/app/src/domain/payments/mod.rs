//! Payments

pub mod errors;
pub mod gateway;
pub mod models;
pub(crate) mod repositories;
pub mod service;

pub use errors::PaymentsServiceError;
pub use gateway::{MockGateway, PaymentGateway};
pub use service::*;
