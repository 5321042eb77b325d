//! Order Models

use std::collections::BTreeMap;

use jiff::{Timestamp, civil::Date};

use harvest::status::OrderStatus;

use crate::{
    domain::{
        identity::models::{ActorUuid, CustomerUuid, ProducerUuid},
        products::models::ProductUuid,
    },
    uuids::TypedUuid,
};

/// Order UUID
pub type OrderUuid = TypedUuid<CustomerOrder>;

/// The aggregate order for one checkout event.
///
/// Monetary fields are integer pence. `total_pence` equals
/// `subtotal_pence`: commission is deducted from producer payouts, not
/// added to the customer's invoice.
#[derive(Debug, Clone)]
pub struct CustomerOrder {
    pub uuid: OrderUuid,
    pub customer: Option<CustomerUuid>,
    /// Address snapshot taken from the customer profile at checkout.
    pub delivery_address: String,
    pub delivery_postcode: String,
    pub delivery_date: Date,
    pub special_instructions: String,
    pub subtotal_pence: u64,
    pub commission_pence: u64,
    pub total_pence: u64,
    pub status: OrderStatus,
    pub producer_orders: Vec<ProducerOrder>,
    pub items: Vec<OrderItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Producer Order UUID
pub type ProducerOrderUuid = TypedUuid<ProducerOrder>;

/// One producer's portion of a customer order.
#[derive(Debug, Clone)]
pub struct ProducerOrder {
    pub uuid: ProducerOrderUuid,
    pub order: OrderUuid,
    pub producer: ProducerUuid,
    pub subtotal_pence: u64,
    pub commission_pence: u64,
    pub payout_pence: u64,
    pub status: OrderStatus,
    /// Effective delivery date, resolved at checkout from the
    /// per-producer override or the aggregate date.
    pub delivery_date: Date,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Order Item UUID
pub type OrderItemUuid = TypedUuid<OrderItem>;

/// An immutable snapshot of a purchased product, captured at checkout
/// so later catalog edits never change historical orders.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub uuid: OrderItemUuid,
    pub order: OrderUuid,
    pub product: Option<ProductUuid>,
    pub product_name: String,
    pub product_unit: String,
    pub price_pence: u64,
    pub quantity: u32,
    pub line_total_pence: u64,
    pub created_at: Timestamp,
}

/// Status Change UUID
pub type StatusChangeUuid = TypedUuid<StatusChange>;

/// Append-only audit record of one producer-order status transition.
#[derive(Debug, Clone)]
pub struct StatusChange {
    pub uuid: StatusChangeUuid,
    pub producer_order: ProducerOrderUuid,
    pub old_status: OrderStatus,
    pub new_status: OrderStatus,
    pub notes: String,
    pub changed_by: Option<ActorUuid>,
    pub changed_at: Timestamp,
}

/// Everything the caller supplies at checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    /// Delivery date for the whole order; producers without an override
    /// deliver on this date.
    pub delivery_date: Date,
    /// Optional per-producer delivery dates.
    pub producer_delivery_dates: BTreeMap<ProducerUuid, Date>,
    pub special_instructions: String,
}

impl CheckoutRequest {
    /// A request delivering everything on one date.
    #[must_use]
    pub fn on(delivery_date: Date) -> Self {
        Self {
            delivery_date,
            producer_delivery_dates: BTreeMap::new(),
            special_instructions: String::new(),
        }
    }
}
