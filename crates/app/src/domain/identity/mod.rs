//! Identity

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::{AccessError, IdentityServiceError};
pub use service::*;
