//! Payments service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::civil::Date;
use mockall::automock;
use tracing::info;

use harvest::commission::Rate;

use crate::{
    database::Db,
    domain::{
        orders::models::OrderUuid,
        payments::{
            errors::PaymentsServiceError,
            gateway::{GatewayStatus, PaymentGateway},
            models::{
                CommissionPolicyRecord, PaymentTransaction, PolicyUuid, TransactionStatus,
                TransactionUuid,
            },
            repositories::{PgCommissionPoliciesRepository, PgTransactionsRepository},
        },
    },
};

pub struct PgPaymentsService {
    db: Db,
    gateway: Arc<dyn PaymentGateway>,
    transactions_repository: PgTransactionsRepository,
    policies_repository: PgCommissionPoliciesRepository,
}

impl PgPaymentsService {
    #[must_use]
    pub fn new(db: Db, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self {
            db,
            gateway,
            transactions_repository: PgTransactionsRepository::new(),
            policies_repository: PgCommissionPoliciesRepository::new(),
        }
    }

    /// Create the pending row for the order, or reuse an earlier
    /// attempt that never reached `captured`.
    async fn begin_transaction_row(
        &self,
        order: OrderUuid,
        amount_pence: u64,
    ) -> Result<PaymentTransaction, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let created = self
            .transactions_repository
            .create_transaction(
                &mut tx,
                TransactionUuid::generate(),
                order,
                amount_pence,
                self.gateway.name(),
            )
            .await
            .map_err(PaymentsServiceError::from);

        match created {
            Ok(transaction) => {
                // Committed before the gateway is touched so a crashed
                // process leaves an auditable attempt behind.
                tx.commit().await?;

                Ok(transaction)
            }
            Err(PaymentsServiceError::AlreadyExists) => {
                // The rejected insert aborts the transaction; reread
                // the existing row on a fresh one.
                drop(tx);

                let mut tx = self.db.begin().await?;

                let existing = self
                    .transactions_repository
                    .get_transaction(&mut tx, order)
                    .await?;

                tx.commit().await?;

                match existing.status {
                    TransactionStatus::Pending | TransactionStatus::Failed => Ok(existing),
                    _ => Err(PaymentsServiceError::AlreadyExists),
                }
            }
            Err(error) => Err(error),
        }
    }

    /// Settle the row as `failed` in its own committed transaction,
    /// keeping whatever gateway reference exists.
    async fn record_failure(
        &self,
        transaction: TransactionUuid,
        gateway_reference: &str,
    ) -> Result<PaymentTransaction, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let failed = self
            .transactions_repository
            .update_transaction(
                &mut tx,
                transaction,
                TransactionStatus::Failed,
                gateway_reference,
            )
            .await?;

        tx.commit().await?;

        Ok(failed)
    }
}

#[async_trait]
impl PaymentsService for PgPaymentsService {
    async fn take_payment(
        &self,
        order: OrderUuid,
        amount_pence: u64,
    ) -> Result<PaymentTransaction, PaymentsServiceError> {
        let transaction = self.begin_transaction_row(order, amount_pence).await?;

        let authorization = match self.gateway.initiate(amount_pence, order).await {
            Ok(authorization) => authorization,
            Err(error) => {
                // A transport failure settles the row too, so a later
                // attempt is not wedged behind a stuck `pending`.
                self.record_failure(transaction.uuid, "").await?;

                info!(
                    order = %order,
                    transaction = %transaction.uuid,
                    "gateway unreachable at authorisation"
                );

                return Err(error.into());
            }
        };

        if authorization.status != GatewayStatus::Authorised {
            let failed = self
                .record_failure(transaction.uuid, &authorization.reference)
                .await?;

            info!(order = %order, transaction = %failed.uuid, "payment declined at authorisation");

            return Err(PaymentsServiceError::Declined {
                gateway: self.gateway.name().to_string(),
            });
        }

        // The reference is committed before capture is attempted; funds
        // held at the gateway always have a durable reference here.
        let mut tx = self.db.begin().await?;

        self.transactions_repository
            .update_transaction(
                &mut tx,
                transaction.uuid,
                TransactionStatus::Authorised,
                &authorization.reference,
            )
            .await?;

        tx.commit().await?;

        let capture = match self.gateway.capture(&authorization.reference).await {
            Ok(capture) => capture,
            Err(error) => {
                // Funds may still be held at the gateway; the reference
                // stays on the failed row for manual reconciliation.
                let failed = self
                    .record_failure(transaction.uuid, &authorization.reference)
                    .await?;

                info!(
                    order = %order,
                    transaction = %failed.uuid,
                    gateway_reference = %failed.gateway_reference,
                    "gateway unreachable at capture"
                );

                return Err(error.into());
            }
        };

        let status = if capture.status == GatewayStatus::Captured {
            TransactionStatus::Captured
        } else {
            TransactionStatus::Failed
        };

        let mut tx = self.db.begin().await?;

        let transaction = self
            .transactions_repository
            .update_transaction(&mut tx, transaction.uuid, status, &authorization.reference)
            .await?;

        tx.commit().await?;

        if status == TransactionStatus::Failed {
            info!(order = %order, transaction = %transaction.uuid, "payment declined at capture");

            return Err(PaymentsServiceError::Declined {
                gateway: self.gateway.name().to_string(),
            });
        }

        info!(
            order = %order,
            transaction = %transaction.uuid,
            amount_pence = transaction.amount_pence,
            "payment captured"
        );

        Ok(transaction)
    }

    async fn get_transaction(
        &self,
        order: OrderUuid,
    ) -> Result<PaymentTransaction, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let transaction = self
            .transactions_repository
            .get_transaction(&mut tx, order)
            .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    async fn set_policy(
        &self,
        rate: Rate,
        valid_from: Date,
        valid_to: Option<Date>,
    ) -> Result<CommissionPolicyRecord, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let policy = self
            .policies_repository
            .create_policy(&mut tx, PolicyUuid::generate(), rate, valid_from, valid_to)
            .await?;

        tx.commit().await?;

        info!(
            policy = %policy.uuid,
            basis_points = policy.rate.basis_points(),
            valid_from = %policy.valid_from,
            "commission policy created"
        );

        Ok(policy)
    }

    async fn list_policies(&self) -> Result<Vec<CommissionPolicyRecord>, PaymentsServiceError> {
        let mut tx = self.db.begin().await?;

        let policies = self.policies_repository.list_policies(&mut tx).await?;

        tx.commit().await?;

        Ok(policies)
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// Charge `amount_pence` for the order through the configured
    /// gateway. One transaction row exists per order; a decline is
    /// recorded on it as `failed` with the gateway reference kept, and
    /// a later attempt reuses the row. Only a captured payment blocks
    /// further attempts.
    async fn take_payment(
        &self,
        order: OrderUuid,
        amount_pence: u64,
    ) -> Result<PaymentTransaction, PaymentsServiceError>;

    /// The order's payment transaction.
    async fn get_transaction(
        &self,
        order: OrderUuid,
    ) -> Result<PaymentTransaction, PaymentsServiceError>;

    /// Record a new commission policy effective from `valid_from`.
    async fn set_policy(
        &self,
        rate: Rate,
        valid_from: Date,
        valid_to: Option<Date>,
    ) -> Result<CommissionPolicyRecord, PaymentsServiceError>;

    /// All stored policies ordered by start date.
    async fn list_policies(&self) -> Result<Vec<CommissionPolicyRecord>, PaymentsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::service::CartsService,
            orders::{models::CheckoutRequest, service::OrdersService},
            payments::gateway::{Authorization, GatewayError, MockPaymentGateway},
        },
        test::{TestContext, helpers},
    };

    use super::*;

    #[tokio::test]
    async fn payment_for_an_order_is_captured() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 2).await?;

        let order = ctx
            .orders
            .create_order(customer, CheckoutRequest::on(helpers::delivery_date()))
            .await?;

        let transaction = ctx
            .payments
            .take_payment(order.uuid, order.total_pence)
            .await?;

        assert_eq!(transaction.status, TransactionStatus::Captured);
        assert_eq!(transaction.amount_pence, 1000);
        assert!(transaction.gateway_reference.starts_with("MOCK-"));

        let fetched = ctx.payments.get_transaction(order.uuid).await?;

        assert_eq!(fetched.uuid, transaction.uuid);

        Ok(())
    }

    #[tokio::test]
    async fn declined_authorisation_is_recorded_as_failed() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(customer, CheckoutRequest::on(helpers::delivery_date()))
            .await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_name().return_const("declining".to_string());
        gateway.expect_initiate().returning(|_, _| {
            Ok(Authorization {
                reference: "DECLINED-1".to_string(),
                status: GatewayStatus::Failed,
            })
        });

        let payments = PgPaymentsService::new(ctx.db.clone(), Arc::new(gateway));

        let result = payments.take_payment(order.uuid, order.total_pence).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::Declined { .. })),
            "expected Declined, got {result:?}"
        );

        let transaction = payments.get_transaction(order.uuid).await?;

        assert_eq!(transaction.status, TransactionStatus::Failed);
        assert_eq!(transaction.gateway_reference, "DECLINED-1");

        Ok(())
    }

    #[tokio::test]
    async fn capture_transport_error_keeps_the_gateway_reference() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(customer, CheckoutRequest::on(helpers::delivery_date()))
            .await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_name().return_const("flaky".to_string());
        gateway.expect_initiate().returning(|_, _| {
            Ok(Authorization {
                reference: "HELD-42".to_string(),
                status: GatewayStatus::Authorised,
            })
        });
        gateway.expect_capture().returning(|_| {
            Err(GatewayError {
                gateway: "flaky".to_string(),
                message: "timeout".to_string(),
            })
        });

        let payments = PgPaymentsService::new(ctx.db.clone(), Arc::new(gateway));

        let result = payments.take_payment(order.uuid, order.total_pence).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::Gateway(_))),
            "expected Gateway error, got {result:?}"
        );

        // The authorised funds keep their reference on the failed row.
        let transaction = payments.get_transaction(order.uuid).await?;

        assert_eq!(transaction.status, TransactionStatus::Failed);
        assert_eq!(transaction.gateway_reference, "HELD-42");

        Ok(())
    }

    #[tokio::test]
    async fn failed_attempt_can_be_retried() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(customer, CheckoutRequest::on(helpers::delivery_date()))
            .await?;

        let mut gateway = MockPaymentGateway::new();
        gateway.expect_name().return_const("down".to_string());
        gateway.expect_initiate().returning(|_, _| {
            Err(GatewayError {
                gateway: "down".to_string(),
                message: "connection refused".to_string(),
            })
        });

        let payments = PgPaymentsService::new(ctx.db.clone(), Arc::new(gateway));

        let result = payments.take_payment(order.uuid, order.total_pence).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::Gateway(_))),
            "expected Gateway error, got {result:?}"
        );

        let failed = ctx.payments.get_transaction(order.uuid).await?;

        assert_eq!(failed.status, TransactionStatus::Failed);

        // A healthy gateway picks the recorded attempt back up.
        let transaction = ctx
            .payments
            .take_payment(order.uuid, order.total_pence)
            .await?;

        assert_eq!(transaction.uuid, failed.uuid);
        assert_eq!(transaction.status, TransactionStatus::Captured);

        Ok(())
    }

    #[tokio::test]
    async fn payment_for_unknown_order_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        let result = ctx.payments.take_payment(OrderUuid::generate(), 100).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::InvalidReference)),
            "expected InvalidReference, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn second_payment_for_the_same_order_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let customer = helpers::create_customer(&ctx).await?;
        let producer = helpers::create_producer(&ctx).await?;
        let product = helpers::create_product(&ctx, Some(producer), 500, 10).await?;

        ctx.carts.add_item(customer, product.uuid, 1).await?;

        let order = ctx
            .orders
            .create_order(customer, CheckoutRequest::on(helpers::delivery_date()))
            .await?;

        ctx.payments
            .take_payment(order.uuid, order.total_pence)
            .await?;

        let result = ctx
            .payments
            .take_payment(order.uuid, order.total_pence)
            .await;

        assert!(
            matches!(result, Err(PaymentsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn policies_are_listed_in_start_date_order() -> TestResult {
        let ctx = TestContext::new().await;

        let rate = Rate::from_basis_points(750)?;
        let start = "2031-01-01".parse::<Date>()?;

        ctx.payments.set_policy(rate, start, None).await?;

        let policies = ctx.payments.list_policies().await?;

        // The migration seeds one open-ended policy.
        assert!(policies.len() >= 2);
        assert!(
            policies
                .windows(2)
                .all(|pair| pair[0].valid_from <= pair[1].valid_from)
        );

        Ok(())
    }

    #[tokio::test]
    async fn duplicate_policy_start_date_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;

        let rate = Rate::from_basis_points(600)?;
        let start = "2032-06-01".parse::<Date>()?;

        ctx.payments.set_policy(rate, start, None).await?;

        let result = ctx.payments.set_policy(rate, start, None).await;

        assert!(
            matches!(result, Err(PaymentsServiceError::AlreadyExists)),
            "expected AlreadyExists, got {result:?}"
        );

        Ok(())
    }
}
