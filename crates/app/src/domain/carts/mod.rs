//! Carts

pub mod errors;
pub mod models;
pub mod pricing;
pub(crate) mod repositories;
pub mod service;

pub use errors::CartsServiceError;
pub use service::*;
