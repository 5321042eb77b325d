//! Carts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{Cart, CartLine, CartLineDetail, CartLineUuid, CartUuid},
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        identity::models::CustomerUuid,
        products::models::ProductUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    lines_repository: PgCartLinesRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            lines_repository: PgCartLinesRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_or_create_cart(
        &self,
        customer: CustomerUuid,
    ) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_or_create_cart(&mut tx, CartUuid::generate(), customer)
            .await?;

        tx.commit().await?;

        Ok(cart)
    }

    async fn add_item(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_or_create_cart(&mut tx, CartUuid::generate(), customer)
            .await?;

        let line = self
            .lines_repository
            .upsert_line(&mut tx, CartLineUuid::generate(), cart.uuid, product, quantity)
            .await?;

        tx.commit().await?;

        Ok(line)
    }

    async fn set_quantity(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_for_customer(&mut tx, customer)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        // A quantity of zero removes the line entirely.
        if quantity == 0 {
            let rows_affected = self
                .lines_repository
                .delete_line(&mut tx, cart.uuid, product)
                .await?;

            if rows_affected == 0 {
                return Err(CartsServiceError::NotFound);
            }
        } else {
            self.lines_repository
                .set_quantity(&mut tx, cart.uuid, product, quantity)
                .await?
                .ok_or(CartsServiceError::NotFound)?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn remove_item(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self
            .carts_repository
            .get_cart_for_customer(&mut tx, customer)
            .await?
            .ok_or(CartsServiceError::NotFound)?;

        let rows_affected = self
            .lines_repository
            .delete_line(&mut tx, cart.uuid, product)
            .await?;

        if rows_affected == 0 {
            return Err(CartsServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }

    async fn get_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineDetail>, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let Some(cart) = self
            .carts_repository
            .get_cart_for_customer(&mut tx, customer)
            .await?
        else {
            return Ok(Vec::new());
        };

        let lines = self
            .lines_repository
            .get_line_details(&mut tx, cart.uuid)
            .await?;

        tx.commit().await?;

        Ok(lines)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The customer's cart, created lazily on first use.
    async fn get_or_create_cart(&self, customer: CustomerUuid)
    -> Result<Cart, CartsServiceError>;

    /// Add a product to the customer's cart, incrementing the quantity
    /// when the product is already present.
    async fn add_item(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError>;

    /// Set the quantity of a product in the cart; zero removes it.
    async fn set_quantity(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<(), CartsServiceError>;

    /// Remove a product from the cart entirely.
    async fn remove_item(
        &self,
        customer: CustomerUuid,
        product: ProductUuid,
    ) -> Result<(), CartsServiceError>;

    /// Every line in the customer's cart joined with product data;
    /// empty when the customer has no cart yet.
    async fn get_lines(
        &self,
        customer: CustomerUuid,
    ) -> Result<Vec<CartLineDetail>, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::carts::pricing,
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn cart_is_created_lazily_and_reused() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;

        let first = ctx.carts.get_or_create_cart(customer).await?;
        let second = ctx.carts.get_or_create_cart(customer).await?;

        assert_eq!(first.uuid, second.uuid);
        assert_eq!(first.customer, customer);

        Ok(())
    }

    #[tokio::test]
    async fn adding_same_product_twice_increments_quantity() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        let first = ctx.carts.add_item(customer, product.uuid, 2).await?;
        let second = ctx.carts.add_item(customer, product.uuid, 3).await?;

        assert_eq!(first.quantity, 2);
        assert_eq!(second.quantity, 5);
        assert_eq!(first.uuid, second.uuid, "must be one line, not two");

        let lines = ctx.carts.get_lines(customer).await?;

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);

        Ok(())
    }

    #[tokio::test]
    async fn adding_unknown_product_is_invalid_reference() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;

        let result = ctx
            .carts
            .add_item(customer, ProductUuid::generate(), 1)
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn zero_quantity_on_add_is_invalid() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        let result = ctx.carts.add_item(customer, product.uuid, 0).await;

        assert!(
            matches!(result, Err(CartsServiceError::InvalidData)),
            "expected InvalidData, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_zero_removes_the_line() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 2).await?;
        ctx.carts.set_quantity(customer, product.uuid, 0).await?;

        let lines = ctx.carts.get_lines(customer).await?;

        assert!(lines.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn set_quantity_updates_the_line() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 2).await?;
        ctx.carts.set_quantity(customer, product.uuid, 7).await?;

        let lines = ctx.carts.get_lines(customer).await?;

        assert_eq!(lines[0].quantity, 7);

        Ok(())
    }

    #[tokio::test]
    async fn remove_item_on_empty_cart_is_not_found() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        let result = ctx.carts.remove_item(customer, product.uuid).await;

        assert!(
            matches!(result, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn line_details_carry_pricing_data() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let apples = helpers::create_product(&ctx, Some(producer), 500, 10).await?;
        let eggs = helpers::create_product(&ctx, Some(producer), 300, 10).await?;

        ctx.carts.add_item(customer, apples.uuid, 2).await?;
        ctx.carts.add_item(customer, eggs.uuid, 1).await?;

        let lines = ctx.carts.get_lines(customer).await?;

        assert_eq!(lines.len(), 2);
        assert_eq!(pricing::total_pence(&lines), 1300);

        let grouped = pricing::group_by_producer(&lines)?;

        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[&producer].len(), 2);

        Ok(())
    }
}
