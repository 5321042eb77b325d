//! Identity Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use crate::domain::identity::models::{
    CustomerProfile, CustomerUuid, NewCustomer, NewProducer, Producer, ProducerUuid,
};

const CREATE_CUSTOMER_SQL: &str = include_str!("sql/create_customer.sql");
const GET_CUSTOMER_SQL: &str = include_str!("sql/get_customer.sql");
const CREATE_PRODUCER_SQL: &str = include_str!("sql/create_producer.sql");
const GET_PRODUCER_SQL: &str = include_str!("sql/get_producer.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgIdentityRepository;

impl PgIdentityRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: NewCustomer,
    ) -> Result<CustomerProfile, sqlx::Error> {
        query_as::<Postgres, CustomerProfile>(CREATE_CUSTOMER_SQL)
            .bind(customer.uuid.into_uuid())
            .bind(customer.street)
            .bind(customer.city)
            .bind(customer.state)
            .bind(customer.country)
            .bind(customer.postcode)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_customer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        customer: CustomerUuid,
    ) -> Result<CustomerProfile, sqlx::Error> {
        query_as::<Postgres, CustomerProfile>(GET_CUSTOMER_SQL)
            .bind(customer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn create_producer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer: NewProducer,
    ) -> Result<Producer, sqlx::Error> {
        query_as::<Postgres, Producer>(CREATE_PRODUCER_SQL)
            .bind(producer.uuid.into_uuid())
            .bind(producer.business_name)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_producer(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        producer: ProducerUuid,
    ) -> Result<Producer, sqlx::Error> {
        query_as::<Postgres, Producer>(GET_PRODUCER_SQL)
            .bind(producer.into_uuid())
            .fetch_one(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CustomerProfile {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CustomerUuid::from_uuid(row.try_get("uuid")?),
            street: row.try_get("street")?,
            city: row.try_get("city")?,
            state: row.try_get("state")?,
            country: row.try_get("country")?,
            postcode: row.try_get("postcode")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for Producer {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: ProducerUuid::from_uuid(row.try_get("uuid")?),
            business_name: row.try_get("business_name")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
