//! Cart Lines Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};
use uuid::Uuid;

use crate::{
    domain::{
        carts::models::{CartLine, CartLineDetail, CartLineUuid, CartUuid},
        identity::models::ProducerUuid,
        products::models::ProductUuid,
    },
    rows::{to_db_quantity, try_get_amount, try_get_quantity},
};

const UPSERT_CART_LINE_SQL: &str = include_str!("../sql/upsert_cart_line.sql");
const SET_CART_LINE_QUANTITY_SQL: &str = include_str!("../sql/set_cart_line_quantity.sql");
const DELETE_CART_LINE_SQL: &str = include_str!("../sql/delete_cart_line.sql");
const GET_CART_LINE_DETAILS_SQL: &str = include_str!("../sql/get_cart_line_details.sql");
const CLEAR_CART_LINES_SQL: &str = include_str!("../sql/clear_cart_lines.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartLinesRepository;

impl PgCartLinesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// Insert a line, or increment the quantity of the existing line
    /// for the same (cart, product).
    pub(crate) async fn upsert_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        line: CartLineUuid,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLine, sqlx::Error> {
        query_as::<Postgres, CartLine>(UPSERT_CART_LINE_SQL)
            .bind(line.into_uuid())
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .bind(to_db_quantity(quantity, "quantity")?)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<Option<CartLine>, sqlx::Error> {
        query_as::<Postgres, CartLine>(SET_CART_LINE_QUANTITY_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .bind(to_db_quantity(quantity, "quantity")?)
            .fetch_optional(&mut **tx)
            .await
    }

    pub(crate) async fn delete_line(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_LINE_SQL)
            .bind(cart.into_uuid())
            .bind(product.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }

    /// Fetch every line joined with its product, eagerly, in cart
    /// insertion order.
    pub(crate) async fn get_line_details(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<Vec<CartLineDetail>, sqlx::Error> {
        query_as::<Postgres, CartLineDetail>(GET_CART_LINE_DETAILS_SQL)
            .bind(cart.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn clear_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart: CartUuid,
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(CLEAR_CART_LINES_SQL)
            .bind(cart.into_uuid())
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartLine {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartLineUuid::from_uuid(row.try_get("uuid")?),
            cart: CartUuid::from_uuid(row.try_get("cart_uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_quantity(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}

impl<'r> FromRow<'r, PgRow> for CartLineDetail {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            uuid: CartLineUuid::from_uuid(row.try_get("uuid")?),
            product: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            producer: row
                .try_get::<Option<Uuid>, _>("producer_uuid")?
                .map(ProducerUuid::from_uuid),
            product_name: row.try_get("product_name")?,
            product_unit: row.try_get("product_unit")?,
            unit_price_pence: try_get_amount(row, "unit_price_pence")?,
            quantity: try_get_quantity(row, "quantity")?,
        })
    }
}
