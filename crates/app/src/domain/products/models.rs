//! Product Models

use jiff::Timestamp;

use crate::{domain::identity::models::ProducerUuid, uuids::TypedUuid};

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    /// Owning producer. Products without one cannot be ordered.
    pub producer: Option<ProducerUuid>,
    pub name: String,
    /// Sale unit, e.g. "kg", "bunch", "dozen".
    pub unit: String,
    pub price_pence: u64,
    pub stock_qty: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Product Model
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub producer: Option<ProducerUuid>,
    pub name: String,
    pub unit: String,
    pub price_pence: u64,
    pub stock_qty: u64,
}
