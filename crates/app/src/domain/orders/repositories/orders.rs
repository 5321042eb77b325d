//! Customer Orders Repository

use jiff::civil::Date;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::{
    domain::{
        identity::models::CustomerUuid,
        orders::models::{CustomerOrder, OrderUuid},
    },
    rows::{to_db_amount, try_get_amount, try_get_status},
};

const CREATE_ORDER_SQL: &str = include_str!("../sql/create_order.sql");
const SET_ORDER_TOTALS_SQL: &str = include_str!("../sql/set_order_totals.sql");
const GET_ORDER_SQL: &str = include_str!("../sql/get_order.sql");

/// Fields persisted when the aggregate order row is first created;
/// totals start at zero and are set once every sub-order is in place.
pub(crate) struct NewOrderRow {
    pub(crate) uuid: OrderUuid,
    pub(crate) customer: CustomerUuid,
    pub(crate) delivery_address: String,
    pub(crate) delivery_postcode: String,
    pub(crate) delivery_date: Date,
    pub(crate) special_instructions: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrdersRepository;

impl PgOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: NewOrderRow,
    ) -> Result<CustomerOrder, sqlx::Error> {
        query_as::<Postgres, CustomerOrder>(CREATE_ORDER_SQL)
            .bind(order.uuid.into_uuid())
            .bind(order.customer.into_uuid())
            .bind(order.delivery_address)
            .bind(order.delivery_postcode)
            .bind(SqlxDate::from(order.delivery_date))
            .bind(order.special_instructions)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_totals(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        subtotal_pence: u64,
        commission_pence: u64,
        total_pence: u64,
    ) -> Result<CustomerOrder, sqlx::Error> {
        query_as::<Postgres, CustomerOrder>(SET_ORDER_TOTALS_SQL)
            .bind(order.into_uuid())
            .bind(to_db_amount(subtotal_pence, "subtotal_pence")?)
            .bind(to_db_amount(commission_pence, "commission_pence")?)
            .bind(to_db_amount(total_pence, "total_pence")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<CustomerOrder, sqlx::Error> {
        query_as::<Postgres, CustomerOrder>(GET_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CustomerOrder {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: OrderUuid::from_uuid(row.try_get("uuid")?),
            customer: row
                .try_get::<Option<Uuid>, _>("customer_uuid")?
                .map(CustomerUuid::from_uuid),
            delivery_address: row.try_get("delivery_address")?,
            delivery_postcode: row.try_get("delivery_postcode")?,
            delivery_date: row.try_get::<SqlxDate, _>("delivery_date")?.to_jiff(),
            special_instructions: row.try_get("special_instructions")?,
            subtotal_pence: try_get_amount(row, "subtotal_pence")?,
            commission_pence: try_get_amount(row, "commission_pence")?,
            total_pence: try_get_amount(row, "total_pence")?,
            status: try_get_status(row, "status")?,
            producer_orders: Vec::new(),
            items: Vec::new(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
