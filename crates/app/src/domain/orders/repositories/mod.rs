//! Order Repositories

mod history;
mod items;
mod orders;
mod producer_orders;

pub(crate) use history::PgStatusHistoryRepository;
pub(crate) use items::{NewOrderItemRow, PgOrderItemsRepository};
pub(crate) use orders::{NewOrderRow, PgOrdersRepository};
pub(crate) use producer_orders::{NewProducerOrderRow, PgProducerOrdersRepository};
