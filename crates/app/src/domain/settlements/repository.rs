//! Settlements Repository

use std::str::FromStr;

use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};
use uuid::Uuid;

use crate::{
    domain::{
        identity::models::ProducerUuid,
        settlements::models::{
            ProducerSettlement, SettlementPeriod, SettlementStatus, SettlementUuid,
        },
    },
    rows::{to_db_amount, try_get_amount},
};

const AGGREGATE_PRODUCER_PERIOD_SQL: &str = include_str!("sql/aggregate_producer_period.sql");
const UPSERT_SETTLEMENT_SQL: &str = include_str!("sql/upsert_settlement.sql");
const PRODUCERS_WITH_ORDERS_SQL: &str = include_str!("sql/producers_with_orders.sql");
const MARK_SETTLEMENT_PAID_SQL: &str = include_str!("sql/mark_settlement_paid.sql");
const GET_SETTLEMENT_SQL: &str = include_str!("sql/get_settlement.sql");

/// Sums over a producer's qualifying sub-orders for one period.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PeriodTotals {
    pub(crate) order_count: u64,
    pub(crate) subtotal_pence: u64,
    pub(crate) commission_pence: u64,
    pub(crate) payout_pence: u64,
}

impl<'r> FromRow<'r, PgRow> for PeriodTotals {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            order_count: try_get_amount(row, "order_count")?,
            subtotal_pence: try_get_amount(row, "subtotal_pence")?,
            commission_pence: try_get_amount(row, "commission_pence")?,
            payout_pence: try_get_amount(row, "payout_pence")?,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgSettlementsRepository;

impl PgSettlementsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Totals over non-cancelled sub-orders delivered in the period.
    pub(crate) async fn aggregate_producer_period(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer: ProducerUuid,
        period: SettlementPeriod,
    ) -> Result<PeriodTotals, sqlx::Error> {
        query_as::<Postgres, PeriodTotals>(AGGREGATE_PRODUCER_PERIOD_SQL)
            .bind(producer.into_uuid())
            .bind(SqlxDate::from(period.start))
            .bind(SqlxDate::from(period.end))
            .fetch_one(&mut **tx)
            .await
    }

    /// Insert or recompute the settlement row for
    /// (producer, period start). Payout state is left untouched on
    /// recompute.
    pub(crate) async fn upsert_settlement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: SettlementUuid,
        producer: ProducerUuid,
        period: SettlementPeriod,
        totals: PeriodTotals,
    ) -> Result<ProducerSettlement, sqlx::Error> {
        query_as::<Postgres, ProducerSettlement>(UPSERT_SETTLEMENT_SQL)
            .bind(uuid.into_uuid())
            .bind(producer.into_uuid())
            .bind(SqlxDate::from(period.start))
            .bind(SqlxDate::from(period.end))
            .bind(to_db_amount(totals.order_count, "order_count")?)
            .bind(to_db_amount(totals.subtotal_pence, "subtotal_pence")?)
            .bind(to_db_amount(totals.commission_pence, "commission_pence")?)
            .bind(to_db_amount(totals.payout_pence, "payout_pence")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn producers_with_orders(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        period: SettlementPeriod,
    ) -> Result<Vec<ProducerUuid>, sqlx::Error> {
        let uuids: Vec<Uuid> = query_scalar(PRODUCERS_WITH_ORDERS_SQL)
            .bind(SqlxDate::from(period.start))
            .bind(SqlxDate::from(period.end))
            .fetch_all(&mut **tx)
            .await?;

        Ok(uuids.into_iter().map(ProducerUuid::from_uuid).collect())
    }

    /// Returns `None` when the settlement is missing or already paid.
    pub(crate) async fn mark_paid(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        settlement: SettlementUuid,
        payment_reference: &str,
    ) -> Result<Option<ProducerSettlement>, sqlx::Error> {
        query_as::<Postgres, ProducerSettlement>(MARK_SETTLEMENT_PAID_SQL)
            .bind(settlement.into_uuid())
            .bind(payment_reference)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn get_settlement(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        settlement: SettlementUuid,
    ) -> Result<Option<ProducerSettlement>, sqlx::Error> {
        query_as::<Postgres, ProducerSettlement>(GET_SETTLEMENT_SQL)
            .bind(settlement.into_uuid())
            .fetch_optional(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ProducerSettlement {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let raw_status: String = row.try_get("status")?;
        let status =
            SettlementStatus::from_str(&raw_status).map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: SettlementUuid::from_uuid(row.try_get("uuid")?),
            producer: ProducerUuid::from_uuid(row.try_get("producer_uuid")?),
            period_start: row.try_get::<SqlxDate, _>("period_start")?.to_jiff(),
            period_end: row.try_get::<SqlxDate, _>("period_end")?.to_jiff(),
            order_count: try_get_amount(row, "order_count")?,
            subtotal_pence: try_get_amount(row, "subtotal_pence")?,
            commission_pence: try_get_amount(row, "commission_pence")?,
            payout_pence: try_get_amount(row, "payout_pence")?,
            status,
            payment_reference: row.try_get("payment_reference")?,
            paid_at: row
                .try_get::<Option<SqlxTimestamp>, _>("paid_at")?
                .map(SqlxTimestamp::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
