//! Payment Transactions Repository

use std::str::FromStr;

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::{
    domain::{
        orders::models::OrderUuid,
        payments::models::{PaymentTransaction, TransactionStatus, TransactionUuid},
    },
    rows::{to_db_amount, try_get_amount},
};

const CREATE_TRANSACTION_SQL: &str = include_str!("../sql/create_transaction.sql");
const UPDATE_TRANSACTION_SQL: &str = include_str!("../sql/update_transaction.sql");
const GET_TRANSACTION_SQL: &str = include_str!("../sql/get_transaction.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgTransactionsRepository;

impl PgTransactionsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction: TransactionUuid,
        order: OrderUuid,
        amount_pence: u64,
        gateway_name: &str,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(CREATE_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .bind(order.into_uuid())
            .bind(to_db_amount(amount_pence, "amount_pence")?)
            .bind(gateway_name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn update_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        transaction: TransactionUuid,
        status: TransactionStatus,
        gateway_reference: &str,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(UPDATE_TRANSACTION_SQL)
            .bind(transaction.into_uuid())
            .bind(status.as_str())
            .bind(gateway_reference)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_transaction(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<PaymentTransaction, sqlx::Error> {
        query_as::<Postgres, PaymentTransaction>(GET_TRANSACTION_SQL)
            .bind(order.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for PaymentTransaction {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let raw_status: String = row.try_get("status")?;
        let status =
            TransactionStatus::from_str(&raw_status).map_err(|e| sqlx::Error::ColumnDecode {
                index: "status".to_string(),
                source: Box::new(e),
            })?;

        Ok(Self {
            uuid: TransactionUuid::from_uuid(row.try_get("uuid")?),
            order: OrderUuid::from_uuid(row.try_get("customer_order_uuid")?),
            amount_pence: try_get_amount(row, "amount_pence")?,
            status,
            gateway_name: row.try_get("gateway_name")?,
            gateway_reference: row.try_get("gateway_reference")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
