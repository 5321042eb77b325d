//! Marketplace Domain Concerns

pub mod carts;
pub mod identity;
pub mod orders;
pub mod payments;
pub mod products;
pub mod settlements;
