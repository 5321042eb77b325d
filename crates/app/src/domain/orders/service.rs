//! Orders service.
//!
//! Checkout turns a cart into one aggregate order plus one sub-order
//! per producer, inside a single transaction. Any failure rolls the
//! whole thing back: no order rows, no stock change, cart intact.

use async_trait::async_trait;
use jiff::{Timestamp, civil::Date};
use mockall::automock;
use tracing::info;

use harvest::{
    commission::{Policy, active_policy},
    lead_time::LeadTime,
    status::OrderStatus,
};

use crate::{
    database::Db,
    domain::{
        carts::{
            models::CartLineDetail,
            pricing,
            repositories::{PgCartLinesRepository, PgCartsRepository},
        },
        identity::{
            models::{Actor, CustomerUuid, ProducerUuid, Role},
            repository::PgIdentityRepository,
        },
        orders::{
            errors::OrdersServiceError,
            models::{
                CheckoutRequest, CustomerOrder, OrderItemUuid, OrderUuid, ProducerOrder,
                ProducerOrderUuid, StatusChange,
            },
            repositories::{
                NewOrderItemRow, NewOrderRow, NewProducerOrderRow, PgOrderItemsRepository,
                PgOrdersRepository, PgProducerOrdersRepository, PgStatusHistoryRepository,
            },
        },
        payments::{
            models::CommissionPolicyRecord, repositories::PgCommissionPoliciesRepository,
        },
        products::repository::PgProductsRepository,
    },
};

pub struct PgOrdersService {
    db: Db,
    lead_time: LeadTime,
    orders_repository: PgOrdersRepository,
    producer_orders_repository: PgProducerOrdersRepository,
    items_repository: PgOrderItemsRepository,
    history_repository: PgStatusHistoryRepository,
    carts_repository: PgCartsRepository,
    lines_repository: PgCartLinesRepository,
    products_repository: PgProductsRepository,
    identity_repository: PgIdentityRepository,
    policies_repository: PgCommissionPoliciesRepository,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db, lead_time: LeadTime) -> Self {
        Self {
            db,
            lead_time,
            orders_repository: PgOrdersRepository::new(),
            producer_orders_repository: PgProducerOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            history_repository: PgStatusHistoryRepository::new(),
            carts_repository: PgCartsRepository::new(),
            lines_repository: PgCartLinesRepository::new(),
            products_repository: PgProductsRepository::new(),
            identity_repository: PgIdentityRepository::new(),
            policies_repository: PgCommissionPoliciesRepository::new(),
        }
    }

    /// Per-producer delivery date: the override when one was given,
    /// otherwise the order-wide date. Both must clear the lead time.
    fn resolve_delivery_date(
        &self,
        request: &CheckoutRequest,
        producer: ProducerUuid,
        placed_at: Timestamp,
    ) -> Result<Date, OrdersServiceError> {
        let requested = request
            .producer_delivery_dates
            .get(&producer)
            .copied()
            .unwrap_or(request.delivery_date);

        if self.lead_time.is_valid(requested, placed_at) {
            Ok(requested)
        } else {
            Err(OrdersServiceError::InvalidDeliveryDate {
                producer,
                requested,
                earliest: self.lead_time.earliest_allowed(placed_at),
            })
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    async fn create_order(
        &self,
        customer: CustomerUuid,
        request: CheckoutRequest,
    ) -> Result<CustomerOrder, OrdersServiceError> {
        let placed_at = Timestamp::now();

        let mut tx = self.db.begin().await?;

        let profile = self.identity_repository.get_customer(&mut tx, customer).await?;

        let Some(cart) = self
            .carts_repository
            .get_cart_for_customer(&mut tx, customer)
            .await?
        else {
            return Err(OrdersServiceError::EmptyCart);
        };

        let lines = self.lines_repository.get_line_details(&mut tx, cart.uuid).await?;

        if lines.is_empty() {
            return Err(OrdersServiceError::EmptyCart);
        }

        let grouped = pricing::group_by_producer(&lines)?;

        // Validate every producer's date before any rows are written.
        let mut sub_orders: Vec<(ProducerUuid, Date, &Vec<&CartLineDetail>)> =
            Vec::with_capacity(grouped.len());

        for (producer, producer_lines) in &grouped {
            let delivery_date = self.resolve_delivery_date(&request, *producer, placed_at)?;

            sub_orders.push((*producer, delivery_date, producer_lines));
        }

        let policies: Vec<Policy> = self
            .policies_repository
            .list_policies(&mut tx)
            .await?
            .iter()
            .map(CommissionPolicyRecord::policy)
            .collect();

        let rate = active_policy(&policies, self.lead_time.local_date(placed_at))?.rate;

        let mut order = self
            .orders_repository
            .create_order(
                &mut tx,
                NewOrderRow {
                    uuid: OrderUuid::generate(),
                    customer,
                    delivery_address: profile.delivery_address(),
                    delivery_postcode: profile.postcode.clone(),
                    delivery_date: request.delivery_date,
                    special_instructions: request.special_instructions.clone(),
                },
            )
            .await?;

        let mut order_subtotal_pence: u64 = 0;
        let mut order_commission_pence: u64 = 0;

        for (producer, delivery_date, producer_lines) in &sub_orders {
            let mut producer_subtotal_pence: u64 = 0;

            for line in producer_lines.iter() {
                let rows_affected = self
                    .products_repository
                    .decrement_stock(&mut tx, line.product, line.quantity)
                    .await?;

                if rows_affected == 0 {
                    return Err(OrdersServiceError::InsufficientStock {
                        product: line.product,
                    });
                }

                self.items_repository
                    .create_item(
                        &mut tx,
                        NewOrderItemRow {
                            uuid: OrderItemUuid::generate(),
                            order: order.uuid,
                            product: line.product,
                            product_name: line.product_name.clone(),
                            product_unit: line.product_unit.clone(),
                            price_pence: line.unit_price_pence,
                            quantity: line.quantity,
                            line_total_pence: line.line_total_pence(),
                        },
                    )
                    .await?;

                producer_subtotal_pence += line.line_total_pence();
            }

            let split = rate.split(producer_subtotal_pence);

            self.producer_orders_repository
                .create_producer_order(
                    &mut tx,
                    NewProducerOrderRow {
                        uuid: ProducerOrderUuid::generate(),
                        order: order.uuid,
                        producer: *producer,
                        subtotal_pence: producer_subtotal_pence,
                        commission_pence: split.commission_pence,
                        payout_pence: split.payout_pence,
                        delivery_date: *delivery_date,
                    },
                )
                .await?;

            order_subtotal_pence += producer_subtotal_pence;
            // Summed from sub-orders, never recomputed on the total, so
            // settlements reconcile to the pence.
            order_commission_pence += split.commission_pence;
        }

        // Commission comes out of producer payouts; the customer pays
        // the plain subtotal.
        order = self
            .orders_repository
            .set_totals(
                &mut tx,
                order.uuid,
                order_subtotal_pence,
                order_commission_pence,
                order_subtotal_pence,
            )
            .await?;

        self.lines_repository.clear_cart(&mut tx, cart.uuid).await?;

        order.producer_orders = self
            .producer_orders_repository
            .list_producer_orders(&mut tx, order.uuid)
            .await?;
        order.items = self.items_repository.list_items(&mut tx, order.uuid).await?;

        tx.commit().await?;

        info!(
            order = %order.uuid,
            customer = %customer,
            producers = order.producer_orders.len(),
            subtotal_pence = order.subtotal_pence,
            commission_pence = order.commission_pence,
            "order created"
        );

        Ok(order)
    }

    async fn get_order(&self, order: OrderUuid) -> Result<CustomerOrder, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let mut order = self.orders_repository.get_order(&mut tx, order).await?;

        order.producer_orders = self
            .producer_orders_repository
            .list_producer_orders(&mut tx, order.uuid)
            .await?;
        order.items = self.items_repository.list_items(&mut tx, order.uuid).await?;

        tx.commit().await?;

        Ok(order)
    }

    async fn get_producer_order(
        &self,
        producer_order: ProducerOrderUuid,
    ) -> Result<ProducerOrder, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let producer_order = self
            .producer_orders_repository
            .get_producer_order(&mut tx, producer_order)
            .await?;

        tx.commit().await?;

        Ok(producer_order)
    }

    async fn transition(
        &self,
        producer_order: ProducerOrderUuid,
        new_status: OrderStatus,
        actor: Actor,
        notes: &str,
    ) -> Result<ProducerOrder, OrdersServiceError> {
        actor.require(&[Role::Producer, Role::Admin])?;

        let mut tx = self.db.begin().await?;

        let current = self
            .producer_orders_repository
            .get_producer_order_for_update(&mut tx, producer_order)
            .await?;

        let next = current.status.transition_to(new_status)?;

        let updated = self
            .producer_orders_repository
            .update_status(&mut tx, producer_order, next)
            .await?;

        self.history_repository
            .append(
                &mut tx,
                producer_order,
                current.status,
                next,
                notes,
                Some(actor.uuid),
            )
            .await?;

        tx.commit().await?;

        info!(
            producer_order = %producer_order,
            from = current.status.as_str(),
            to = next.as_str(),
            "producer order transitioned"
        );

        Ok(updated)
    }

    async fn status_history(
        &self,
        producer_order: ProducerOrderUuid,
    ) -> Result<Vec<StatusChange>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        // Missing sub-orders surface as NotFound rather than an empty
        // history.
        self.producer_orders_repository
            .get_producer_order(&mut tx, producer_order)
            .await?;

        let changes = self
            .history_repository
            .list_changes(&mut tx, producer_order)
            .await?;

        tx.commit().await?;

        Ok(changes)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Check out the customer's cart: one aggregate order, one
    /// sub-order per producer, item snapshots, stock decrements and the
    /// commission split, atomically. The cart is emptied on success.
    async fn create_order(
        &self,
        customer: CustomerUuid,
        request: CheckoutRequest,
    ) -> Result<CustomerOrder, OrdersServiceError>;

    /// The aggregate order with its sub-orders and items attached.
    async fn get_order(&self, order: OrderUuid) -> Result<CustomerOrder, OrdersServiceError>;

    /// A single producer's sub-order.
    async fn get_producer_order(
        &self,
        producer_order: ProducerOrderUuid,
    ) -> Result<ProducerOrder, OrdersServiceError>;

    /// Move a sub-order along the status flow, appending one audit
    /// record. Only producers and admins may do this.
    async fn transition(
        &self,
        producer_order: ProducerOrderUuid,
        new_status: OrderStatus,
        actor: Actor,
        notes: &str,
    ) -> Result<ProducerOrder, OrdersServiceError>;

    /// Every status change of a sub-order, oldest first.
    async fn status_history(
        &self,
        producer_order: ProducerOrderUuid,
    ) -> Result<Vec<StatusChange>, OrdersServiceError>;
}
