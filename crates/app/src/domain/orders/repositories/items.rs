//! Order Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    domain::{
        orders::models::{OrderItem, OrderItemUuid, OrderUuid},
        products::models::ProductUuid,
    },
    rows::{to_db_amount, to_db_quantity, try_get_amount, try_get_quantity},
};

const CREATE_ORDER_ITEM_SQL: &str = include_str!("../sql/create_order_item.sql");
const LIST_ORDER_ITEMS_SQL: &str = include_str!("../sql/list_order_items.sql");

pub(crate) struct NewOrderItemRow {
    pub(crate) uuid: OrderItemUuid,
    pub(crate) order: OrderUuid,
    pub(crate) product: ProductUuid,
    pub(crate) product_name: String,
    pub(crate) product_unit: String,
    pub(crate) price_pence: u64,
    pub(crate) quantity: u32,
    pub(crate) line_total_pence: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        item: NewOrderItemRow,
    ) -> Result<OrderItem, sqlx::Error> {
        query_as::<Postgres, OrderItem>(CREATE_ORDER_ITEM_SQL)
            .bind(item.uuid.into_uuid())
            .bind(item.order.into_uuid())
            .bind(item.product.into_uuid())
            .bind(item.product_name)
            .bind(item.product_unit)
            .bind(to_db_amount(item.price_pence, "price_pence")?)
            .bind(to_db_quantity(item.quantity, "quantity")?)
            .bind(to_db_amount(item.line_total_pence, "line_total_pence")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        query_as::<Postgres, OrderItem>(LIST_ORDER_ITEMS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderItemUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("customer_order_uuid")?),
            product: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductUuid::from_uuid),
            product_name: row.try_get("product_name")?,
            product_unit: row.try_get("product_unit")?,
            price_pence: try_get_amount(row, "price_pence")?,
            quantity: try_get_quantity(row, "quantity")?,
            line_total_pence: try_get_amount(row, "line_total_pence")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
