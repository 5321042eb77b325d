//! Commission Policies Repository

use jiff::civil::Date;
use jiff_sqlx::{Date as SqlxDate, Timestamp as SqlxTimestamp};
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};

use harvest::commission::Rate;

use crate::domain::payments::models::{CommissionPolicyRecord, PolicyUuid};

const CREATE_POLICY_SQL: &str = include_str!("../sql/create_policy.sql");
const LIST_POLICIES_SQL: &str = include_str!("../sql/list_policies.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCommissionPoliciesRepository;

impl PgCommissionPoliciesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_policy(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        uuid: PolicyUuid,
        rate: Rate,
        valid_from: Date,
        valid_to: Option<Date>,
    ) -> Result<CommissionPolicyRecord, sqlx::Error> {
        query_as::<Postgres, CommissionPolicyRecord>(CREATE_POLICY_SQL)
            .bind(uuid.into_uuid())
            .bind(i64::from(rate.basis_points()))
            .bind(SqlxDate::from(valid_from))
            .bind(valid_to.map(SqlxDate::from))
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_policies(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<CommissionPolicyRecord>, sqlx::Error> {
        query_as::<Postgres, CommissionPolicyRecord>(LIST_POLICIES_SQL)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for CommissionPolicyRecord {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        let basis_points_i64: i64 = row.try_get("rate_basis_points")?;
        let basis_points =
            u32::try_from(basis_points_i64).map_err(|e| sqlx::Error::ColumnDecode {
                index: "rate_basis_points".to_string(),
                source: Box::new(e),
            })?;
        let rate = Rate::from_basis_points(basis_points).map_err(|e| sqlx::Error::ColumnDecode {
            index: "rate_basis_points".to_string(),
            source: Box::new(e),
        })?;

        Ok(Self {
            uuid: PolicyUuid::from_uuid(row.try_get("uuid")?),
            rate,
            valid_from: row.try_get::<SqlxDate, _>("valid_from")?.to_jiff(),
            valid_to: row
                .try_get::<Option<SqlxDate>, _>("valid_to")?
                .map(SqlxDate::to_jiff),
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
        })
    }
}
