//! Producer Orders Repository

use jiff::civil::Date;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use harvest::status::OrderStatus;

use crate::{
    domain::{
        identity::models::ProducerUuid,
        orders::models::{OrderUuid, ProducerOrder, ProducerOrderUuid},
    },
    rows::{to_db_amount, try_get_amount, try_get_status},
};

const CREATE_PRODUCER_ORDER_SQL: &str = include_str!("../sql/create_producer_order.sql");
const GET_PRODUCER_ORDER_SQL: &str = include_str!("../sql/get_producer_order.sql");
const GET_PRODUCER_ORDER_FOR_UPDATE_SQL: &str =
    include_str!("../sql/get_producer_order_for_update.sql");
const LIST_PRODUCER_ORDERS_SQL: &str = include_str!("../sql/list_producer_orders.sql");
const UPDATE_PRODUCER_ORDER_STATUS_SQL: &str =
    include_str!("../sql/update_producer_order_status.sql");

pub(crate) struct NewProducerOrderRow {
    pub(crate) uuid: ProducerOrderUuid,
    pub(crate) order: OrderUuid,
    pub(crate) producer: ProducerUuid,
    pub(crate) subtotal_pence: u64,
    pub(crate) commission_pence: u64,
    pub(crate) payout_pence: u64,
    pub(crate) delivery_date: Date,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgProducerOrdersRepository;

impl PgProducerOrdersRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_producer_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        sub_order: NewProducerOrderRow,
    ) -> Result<ProducerOrder, sqlx::Error> {
        query_as::<Postgres, ProducerOrder>(CREATE_PRODUCER_ORDER_SQL)
            .bind(sub_order.uuid.into_uuid())
            .bind(sub_order.order.into_uuid())
            .bind(sub_order.producer.into_uuid())
            .bind(to_db_amount(sub_order.subtotal_pence, "subtotal_pence")?)
            .bind(to_db_amount(sub_order.commission_pence, "commission_pence")?)
            .bind(to_db_amount(sub_order.payout_pence, "payout_pence")?)
            .bind(SqlxDate::from(sub_order.delivery_date))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_producer_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer_order: ProducerOrderUuid,
    ) -> Result<ProducerOrder, sqlx::Error> {
        query_as::<Postgres, ProducerOrder>(GET_PRODUCER_ORDER_SQL)
            .bind(producer_order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    /// Fetch with a row write lock so concurrent transitions against the
    /// same sub-order serialize instead of double-applying.
    pub(crate) async fn get_producer_order_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer_order: ProducerOrderUuid,
    ) -> Result<ProducerOrder, sqlx::Error> {
        query_as::<Postgres, ProducerOrder>(GET_PRODUCER_ORDER_FOR_UPDATE_SQL)
            .bind(producer_order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_producer_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<ProducerOrder>, sqlx::Error> {
        query_as::<Postgres, ProducerOrder>(LIST_PRODUCER_ORDERS_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn update_status(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer_order: ProducerOrderUuid,
        status: OrderStatus,
    ) -> Result<ProducerOrder, sqlx::Error> {
        query_as::<Postgres, ProducerOrder>(UPDATE_PRODUCER_ORDER_STATUS_SQL)
            .bind(producer_order.into_uuid())
            .bind(status.as_str())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProducerOrder {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProducerOrderUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("customer_order_uuid")?),
            producer: ProducerUuid::from_uuid(row.try_get("producer_uuid")?),
            subtotal_pence: try_get_amount(row, "subtotal_pence")?,
            commission_pence: try_get_amount(row, "commission_pence")?,
            payout_pence: try_get_amount(row, "payout_pence")?,
            status: try_get_status(row, "status")?,
            delivery_date: row.try_get::<SqlxDate, _>("delivery_date")?.to_jiff(),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
