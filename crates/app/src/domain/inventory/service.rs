//! Inventory service.
//!
//! Sole owner of stock-quantity truth. Deduction and restoration are planned
//! by [`granary::ledger`] over a snapshot of the product's batches and applied
//! row by row, then the denormalized product quantity is rewritten from the
//! batch sum. Concurrent deductions against the same batches are serialized
//! only by the store's row locking; there is no version column.

use async_trait::async_trait;
use granary::ledger::{self, BatchId, BatchState, Deduction};
use mockall::automock;
use sqlx::{Postgres, Transaction};
use tracing::warn;

use crate::{
    database::Db,
    domain::{
        inventory::{
            errors::InventoryServiceError,
            models::{AppliedDeduction, Batch, RestoredStock},
            repository::PgBatchesRepository,
        },
        orders::models::OrderUuid,
        products::models::ProductUuid,
    },
};

fn encode_delta(amount: u64) -> Result<i64, InventoryServiceError> {
    i64::try_from(amount).map_err(|_| InventoryServiceError::InvalidData)
}

fn states(batches: &[Batch]) -> Vec<BatchState> {
    batches.iter().map(Batch::state).collect()
}

#[derive(Debug, Clone)]
pub struct PgInventoryService {
    db: Db,
    repository: PgBatchesRepository,
}

impl PgInventoryService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgBatchesRepository::new(),
        }
    }

    /// FIFO deduction within the given transaction.
    ///
    /// Plans first, applies only a fully covering plan, then resyncs the
    /// product quantity. Returns the per-batch deductions that were applied.
    pub(crate) async fn deduct_stock_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
        needed: u64,
    ) -> Result<Vec<Deduction>, InventoryServiceError> {
        let batches = self.repository.batches_for_product(tx, product).await?;

        let plan = ledger::plan_deduction(&states(&batches), needed)?;

        for deduction in plan.deductions() {
            let delta = encode_delta(deduction.amount)?;
            self.repository
                .adjust_batch_remaining(tx, deduction.batch, -delta)
                .await?;
        }

        self.repository.sync_product_quantity(tx, product).await?;

        Ok(plan.deductions().to_vec())
    }

    /// Exact reversal of previously applied deductions, within the given
    /// transaction. Returns the number of units that no longer fit anywhere.
    pub(crate) async fn compensate_deductions_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        applied: &[AppliedDeduction],
    ) -> Result<u64, InventoryServiceError> {
        let mut unrestored = 0;

        let mut products: Vec<ProductUuid> = Vec::new();
        for entry in applied {
            if !products.contains(&entry.product) {
                products.push(entry.product);
            }
        }

        for product in products {
            let deductions: Vec<Deduction> = applied
                .iter()
                .filter(|entry| entry.product == product)
                .map(|entry| entry.deduction)
                .collect();

            let batches = self.repository.batches_for_product(tx, product).await?;
            let plan = ledger::plan_compensating_restore(&states(&batches), &deductions);

            for restoration in plan.restorations() {
                let delta = encode_delta(restoration.amount)?;
                self.repository
                    .adjust_batch_remaining(tx, restoration.batch, delta)
                    .await?;
            }

            if plan.unrestored() > 0 {
                warn!(
                    product = %product,
                    unrestored = plan.unrestored(),
                    "compensation could not return every deducted unit"
                );
            }

            unrestored += plan.unrestored();
            self.repository.sync_product_quantity(tx, product).await?;
        }

        Ok(unrestored)
    }

    /// Return an order's quantities to stock, newest batches first, within the
    /// given transaction.
    pub(crate) async fn restore_order_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<RestoredStock>, InventoryServiceError> {
        let items = self.repository.order_quantities(tx, order).await?;

        if items.is_empty() {
            return Err(InventoryServiceError::EmptyOrder);
        }

        let mut restored = Vec::new();

        for item in items {
            let Some(product) = item.product else {
                continue;
            };

            if item.quantity == 0 {
                continue;
            }

            let batches = self.repository.batches_for_product(tx, product).await?;
            if batches.is_empty() {
                // The product's batches were removed since the order was
                // placed; restoration has nowhere to go.
                continue;
            }

            let plan = ledger::plan_cancel_restore(&states(&batches), item.quantity);

            if plan.unrestored() > 0 {
                warn!(
                    order = %order,
                    product = %product,
                    unrestored = plan.unrestored(),
                    "cancelled stock exceeds remaining batch headroom"
                );
            }

            for restoration in plan.restorations() {
                let delta = encode_delta(restoration.amount)?;
                self.repository
                    .adjust_batch_remaining(tx, restoration.batch, delta)
                    .await?;

                restored.push(RestoredStock {
                    order,
                    product,
                    batch: restoration.batch,
                    amount: restoration.amount,
                });
            }

            self.repository.sync_product_quantity(tx, product).await?;
        }

        Ok(restored)
    }
}

#[async_trait]
impl InventoryService for PgInventoryService {
    async fn total_stock(&self, product: ProductUuid) -> Result<u64, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let total = self.repository.total_remaining(&mut tx, product).await?;

        tx.commit().await?;

        Ok(total)
    }

    async fn batches_for_product(
        &self,
        product: ProductUuid,
    ) -> Result<Vec<Batch>, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let batches = self.repository.batches_for_product(&mut tx, product).await?;

        tx.commit().await?;

        Ok(batches)
    }

    async fn sync_product_quantity(
        &self,
        product: ProductUuid,
    ) -> Result<u64, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let quantity = self.repository.sync_product_quantity(&mut tx, product).await?;

        tx.commit().await?;

        Ok(quantity)
    }

    async fn adjust_batch_quantity(
        &self,
        batch: BatchId,
        delta: i64,
    ) -> Result<Batch, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let current = self.repository.get_batch(&mut tx, batch).await?;

        // Clamp instead of failing: an adjustment may not take the remaining
        // quantity below zero or past the imported quantity.
        let target = if delta.is_negative() {
            current.quantity_remaining.saturating_sub(delta.unsigned_abs())
        } else {
            current
                .quantity_remaining
                .saturating_add(delta.unsigned_abs())
                .min(current.quantity_imported)
        };

        let updated = self
            .repository
            .set_batch_remaining(&mut tx, batch, target)
            .await?;

        self.repository
            .sync_product_quantity(&mut tx, current.product_uuid)
            .await?;

        tx.commit().await?;

        Ok(updated)
    }

    async fn deduct_stock(
        &self,
        product: ProductUuid,
        needed: u64,
    ) -> Result<Vec<Deduction>, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let deductions = self.deduct_stock_in(&mut tx, product, needed).await?;

        tx.commit().await?;

        Ok(deductions)
    }

    async fn compensate_deductions(
        &self,
        applied: &[AppliedDeduction],
    ) -> Result<u64, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let unrestored = self.compensate_deductions_in(&mut tx, applied).await?;

        tx.commit().await?;

        Ok(unrestored)
    }

    async fn restore_stock_for_order(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<RestoredStock>, InventoryServiceError> {
        let mut tx = self.db.begin().await?;

        let restored = self.restore_order_in(&mut tx, order).await?;

        tx.commit().await?;

        Ok(restored)
    }
}

#[automock]
#[async_trait]
pub trait InventoryService: Send + Sync {
    /// Sum of remaining quantities across the product's batches (0 if none).
    async fn total_stock(&self, product: ProductUuid) -> Result<u64, InventoryServiceError>;

    /// The product's batches, oldest import first.
    async fn batches_for_product(
        &self,
        product: ProductUuid,
    ) -> Result<Vec<Batch>, InventoryServiceError>;

    /// Rewrites the denormalized product quantity from the batch sum.
    /// Idempotent.
    async fn sync_product_quantity(
        &self,
        product: ProductUuid,
    ) -> Result<u64, InventoryServiceError>;

    /// Applies a signed delta to one batch's remaining quantity, clamped to
    /// `[0, quantity_imported]`, and resyncs the product total.
    async fn adjust_batch_quantity(
        &self,
        batch: BatchId,
        delta: i64,
    ) -> Result<Batch, InventoryServiceError>;

    /// FIFO stock deduction. Either the full quantity is deducted and the
    /// per-batch breakdown returned, or nothing is touched.
    async fn deduct_stock(
        &self,
        product: ProductUuid,
        needed: u64,
    ) -> Result<Vec<Deduction>, InventoryServiceError>;

    /// Reverses previously applied deductions batch by batch. Returns the
    /// units that no longer fit anywhere.
    async fn compensate_deductions(
        &self,
        applied: &[AppliedDeduction],
    ) -> Result<u64, InventoryServiceError>;

    /// Returns a cancelled order's quantities to stock, newest batches first.
    async fn restore_stock_for_order(
        &self,
        order: OrderUuid,
    ) -> Result<Vec<RestoredStock>, InventoryServiceError>;
}
