//! Cart Models

use jiff::Timestamp;

use crate::{
    domain::{identity::models::{CustomerUuid, ProducerUuid}, products::models::ProductUuid},
    uuids::TypedUuid,
};

/// Cart UUID
pub type CartUuid = TypedUuid<Cart>;

/// Cart Model
///
/// One cart per customer, created lazily on first use. Checkout empties
/// the cart's lines; the cart row itself persists for reuse.
#[derive(Debug, Clone)]
pub struct Cart {
    pub uuid: CartUuid,
    pub customer: CustomerUuid,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Cart Line UUID
pub type CartLineUuid = TypedUuid<CartLine>;

/// CartLine Model
///
/// Unique per (cart, product); adding the same product again increments
/// the quantity instead of creating a second line.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub uuid: CartLineUuid,
    pub cart: CartUuid,
    pub product: ProductUuid,
    pub quantity: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// A cart line joined with the product data needed for pricing and
/// checkout, fetched eagerly in one query.
#[derive(Debug, Clone)]
pub struct CartLineDetail {
    pub uuid: CartLineUuid,
    pub product: ProductUuid,
    pub producer: Option<ProducerUuid>,
    pub product_name: String,
    pub product_unit: String,
    pub unit_price_pence: u64,
    pub quantity: u32,
}

impl CartLineDetail {
    /// Unit price times quantity, in pence.
    #[must_use]
    pub fn line_total_pence(&self) -> u64 {
        self.unit_price_pence * u64::from(self.quantity)
    }
}
