//! Status History Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use harvest::status::OrderStatus;

use crate::{
    domain::{
        identity::models::ActorUuid,
        orders::models::{ProducerOrderUuid, StatusChange, StatusChangeUuid},
    },
    rows::try_get_status,
};

const APPEND_STATUS_CHANGE_SQL: &str = include_str!("../sql/append_status_change.sql");
const LIST_STATUS_CHANGES_SQL: &str = include_str!("../sql/list_status_changes.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgStatusHistoryRepository;

impl PgStatusHistoryRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer_order: ProducerOrderUuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
        notes: &str,
        changed_by: Option<ActorUuid>,
    ) -> Result<StatusChange, sqlx::Error> {
        query_as::<Postgres, StatusChange>(APPEND_STATUS_CHANGE_SQL)
            .bind(StatusChangeUuid::generate().into_uuid())
            .bind(producer_order.into_uuid())
            .bind(old_status.as_str())
            .bind(new_status.as_str())
            .bind(notes)
            .bind(changed_by.map(ActorUuid::into_uuid))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_changes(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer_order: ProducerOrderUuid,
    ) -> Result<Vec<StatusChange>, sqlx::Error> {
        query_as::<Postgres, StatusChange>(LIST_STATUS_CHANGES_SQL)
            .bind(producer_order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for StatusChange {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: StatusChangeUuid::from_uuid(row.try_get("uuid")?),
            producer_order: ProducerOrderUuid::from_uuid(row.try_get("producer_order_uuid")?),
            old_status: try_get_status(row, "old_status")?,
            new_status: try_get_status(row, "new_status")?,
            notes: row.try_get("notes")?,
            changed_by: row
                .try_get::<Option<Uuid>, _>("changed_by")?
                .map(ActorUuid::from_uuid),
            changed_at: row.try_get::<SqlxTimestamp, _>("changed_at")?.to_jiff(),
        })
    }
}
