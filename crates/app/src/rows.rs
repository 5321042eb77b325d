//! Row decoding helpers shared by the repositories.

use std::str::FromStr;

use sqlx::{Row, postgres::PgRow};

use harvest::status::OrderStatus;

/// Decode a pence amount stored as `BIGINT` into a `u64`.
pub(crate) fn try_get_amount(row: &PgRow, col: &str) -> Result<u64, sqlx::Error> {
    let amount_i64: i64 = row.try_get(col)?;

    u64::try_from(amount_i64).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Convert a pence amount into the `BIGINT` bind representation.
pub(crate) fn to_db_amount(amount: u64, col: &str) -> Result<i64, sqlx::Error> {
    i64::try_from(amount).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Decode a quantity stored as `INTEGER` into a `u32`.
pub(crate) fn try_get_quantity(row: &PgRow, col: &str) -> Result<u32, sqlx::Error> {
    let qty_i32: i32 = row.try_get(col)?;

    u32::try_from(qty_i32).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Convert a quantity into the `INTEGER` bind representation.
pub(crate) fn to_db_quantity(quantity: u32, col: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}

/// Decode a status column into an [`OrderStatus`].
pub(crate) fn try_get_status(row: &PgRow, col: &str) -> Result<OrderStatus, sqlx::Error> {
    let raw: String = row.try_get(col)?;

    OrderStatus::from_str(&raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: col.to_string(),
        source: Box::new(e),
    })
}
