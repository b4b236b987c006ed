//! Orders service.
//!
//! Settlement creates an order as an all-or-nothing unit across the order,
//! item, payment, and cart tables. Stock deductions run through the inventory
//! service and commit independently of the settlement transaction, so a
//! failure after the first deduction triggers an explicit compensating
//! restoration of the applied per-batch amounts before the error propagates.

use async_trait::async_trait;
use granary::order::{OrderStatus, PaymentStatus, StatusEffect};
use mockall::automock;
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        carts::repositories::PgCartItemsRepository,
        inventory::{
            InventoryService,
            models::AppliedDeduction,
            service::PgInventoryService,
        },
        orders::{
            errors::OrdersServiceError,
            models::{Caller, NewOrder, Order, OrderDetails, OrderUuid, Payment},
            repositories::{PgOrderItemsRepository, PgOrdersRepository, PgPaymentsRepository},
        },
        products::repository::PgProductsRepository,
    },
};

#[derive(Debug, Clone)]
pub struct PgOrdersService {
    db: Db,
    orders_repository: PgOrdersRepository,
    items_repository: PgOrderItemsRepository,
    payments_repository: PgPaymentsRepository,
    cart_items_repository: PgCartItemsRepository,
    products_repository: PgProductsRepository,
    inventory: PgInventoryService,
}

impl PgOrdersService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            inventory: PgInventoryService::new(db.clone()),
            db,
            orders_repository: PgOrdersRepository::new(),
            items_repository: PgOrderItemsRepository::new(),
            payments_repository: PgPaymentsRepository::new(),
            cart_items_repository: PgCartItemsRepository::new(),
            products_repository: PgProductsRepository::new(),
        }
    }

    /// Best-effort reversal of the deductions a failed settlement applied.
    /// Failures here are logged, never raised: the settlement's original
    /// error is the one the caller must see.
    async fn compensate(&self, applied: &[AppliedDeduction]) {
        if applied.is_empty() {
            return;
        }

        match self.inventory.compensate_deductions(applied).await {
            Ok(0) => {}
            Ok(unrestored) => {
                warn!(unrestored, "settlement compensation left units unrestored");
            }
            Err(error) => {
                warn!(%error, "settlement compensation failed");
            }
        }
    }

    fn authorize_read(caller: &Caller, order: &Order) -> Result<(), OrdersServiceError> {
        if caller.admin || order.user_id == caller.user_id {
            Ok(())
        } else {
            Err(OrdersServiceError::Forbidden)
        }
    }
}

#[async_trait]
impl OrdersService for PgOrdersService {
    #[tracing::instrument(skip(self, order), fields(order_uuid = %order.uuid))]
    async fn create_order(&self, order: NewOrder) -> Result<OrderDetails, OrdersServiceError> {
        if order.items.is_empty() {
            return Err(OrdersServiceError::EmptyOrder);
        }

        if order.delivery_address.trim().is_empty() {
            return Err(OrdersServiceError::MissingDeliveryAddress);
        }

        let mut tx = self.db.begin().await?;

        let created = self.orders_repository.create_order(&mut tx, &order).await?;

        let mut items = Vec::with_capacity(order.items.len());
        for line in &order.items {
            let item = self
                .items_repository
                .insert_item(&mut tx, created.uuid, line)
                .await?;
            items.push(item);
        }

        // Deductions commit outside the settlement transaction; `applied` is
        // the trail compensation replays if a later step fails.
        let mut applied: Vec<AppliedDeduction> = Vec::new();

        for line in &order.items {
            match self
                .inventory
                .deduct_stock(line.product_uuid, line.quantity)
                .await
            {
                Ok(deductions) => {
                    applied.extend(deductions.into_iter().map(|deduction| AppliedDeduction {
                        product: line.product_uuid,
                        deduction,
                    }));
                }
                Err(error) => {
                    drop(tx);
                    self.compensate(&applied).await;
                    return Err(OrdersServiceError::from_inventory(line.product_uuid, error));
                }
            }
        }

        let payment = match self
            .payments_repository
            .create_payment(
                &mut tx,
                created.uuid,
                order.total,
                order.payment_method.unwrap_or_default(),
            )
            .await
        {
            Ok(payment) => payment,
            Err(error) => {
                drop(tx);
                self.compensate(&applied).await;
                return Err(error.into());
            }
        };

        let cart_item_ids: Vec<i64> = order
            .items
            .iter()
            .filter_map(|line| line.cart_item_id)
            .collect();

        if !cart_item_ids.is_empty() {
            if let Err(error) = self
                .cart_items_repository
                .delete_items(&mut tx, &order.user_id, &cart_item_ids)
                .await
            {
                drop(tx);
                self.compensate(&applied).await;
                return Err(error.into());
            }
        }

        if let Err(error) = tx.commit().await {
            self.compensate(&applied).await;
            return Err(error.into());
        }

        Ok(OrderDetails {
            order: created,
            items,
            payment: Some(payment),
        })
    }

    async fn get_order(
        &self,
        caller: &Caller,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let order_row = self.orders_repository.get_order(&mut tx, order).await?;
        Self::authorize_read(caller, &order_row)?;

        let items = self.items_repository.items_for_order(&mut tx, order).await?;
        let payment = self
            .payments_repository
            .payment_for_order(&mut tx, order)
            .await?;

        tx.commit().await?;

        Ok(OrderDetails {
            order: order_row,
            items,
            payment,
        })
    }

    async fn list_orders(&self, caller: &Caller) -> Result<Vec<Order>, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let orders = if caller.admin {
            self.orders_repository.list_orders(&mut tx).await?
        } else {
            self.orders_repository
                .list_orders_for_user(&mut tx, &caller.user_id)
                .await?
        };

        tx.commit().await?;

        Ok(orders)
    }

    #[tracing::instrument(skip(self, caller), fields(order_uuid = %order))]
    async fn update_order_status(
        &self,
        caller: &Caller,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.orders_repository.get_order(&mut tx, order).await?;

        if !caller.admin {
            // Customers may only cancel their own order while it is pending.
            if current.user_id != caller.user_id
                || status != OrderStatus::Cancelled
                || current.status != OrderStatus::Pending
            {
                return Err(OrdersServiceError::Forbidden);
            }
        }

        if !current.status.can_transition_to(status) {
            return Err(OrdersServiceError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .orders_repository
            .update_status(&mut tx, order, status)
            .await?;

        tx.commit().await?;

        // Side effects run after the status write is committed; a failure
        // here propagates but the status change stays.
        match status.entry_effect() {
            StatusEffect::RestoreStock => {
                self.inventory.restore_stock_for_order(order).await?;
            }
            StatusEffect::RecordSales => {
                let mut tx = self.db.begin().await?;

                let items = self.items_repository.items_for_order(&mut tx, order).await?;
                for item in items {
                    let Some(product) = item.product_uuid else {
                        continue;
                    };

                    self.products_repository
                        .record_sales(&mut tx, product, item.quantity)
                        .await?;
                }

                tx.commit().await?;
            }
            StatusEffect::None => {}
        }

        Ok(updated)
    }

    async fn update_payment_status(
        &self,
        order: OrderUuid,
        status: PaymentStatus,
    ) -> Result<Payment, OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self
            .payments_repository
            .payment_for_order(&mut tx, order)
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        if !current.status.can_transition_to(status) {
            return Err(OrdersServiceError::InvalidPaymentTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self
            .payments_repository
            .update_status(&mut tx, order, status)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn delete_order(&self, order: OrderUuid) -> Result<(), OrdersServiceError> {
        let mut tx = self.db.begin().await?;

        let rows_affected = self.orders_repository.delete_order(&mut tx, order).await?;

        if rows_affected == 0 {
            return Err(OrdersServiceError::NotFound);
        }

        tx.commit().await?;

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Settles a new order: order row, item snapshots, FIFO stock deduction,
    /// unpaid payment row, and removal of the purchased cart items. Reverses
    /// any applied deductions if a later step fails.
    async fn create_order(&self, order: NewOrder) -> Result<OrderDetails, OrdersServiceError>;

    /// An order with items and payment. Customers see only their own.
    async fn get_order(
        &self,
        caller: &Caller,
        order: OrderUuid,
    ) -> Result<OrderDetails, OrdersServiceError>;

    /// The caller's orders; every order for admins.
    async fn list_orders(&self, caller: &Caller) -> Result<Vec<Order>, OrdersServiceError>;

    /// Moves an order along its lifecycle. Entering `cancelled` restores
    /// stock; entering `completed` records sales. Customers may only cancel
    /// their own pending orders.
    async fn update_order_status(
        &self,
        caller: &Caller,
        order: OrderUuid,
        status: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;

    /// Moves an order's payment along its lifecycle.
    async fn update_payment_status(
        &self,
        order: OrderUuid,
        status: PaymentStatus,
    ) -> Result<Payment, OrdersServiceError>;

    /// Hard-deletes an order; items and payment cascade. Stock is not
    /// restored (cancellation is the reversal path).
    async fn delete_order(&self, order: OrderUuid) -> Result<(), OrdersServiceError>;
}
