//! Import receipts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        inventory::repository::PgBatchesRepository,
        products::models::ProductUuid,
        receipts::{
            errors::ReceiptsServiceError,
            models::{ImportReceipt, NewImportReceipt, ReceiptDetails},
            repository::PgReceiptsRepository,
        },
    },
};

#[derive(Debug, Clone)]
pub struct PgReceiptsService {
    db: Db,
    repository: PgReceiptsRepository,
    batches_repository: PgBatchesRepository,
}

impl PgReceiptsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            repository: PgReceiptsRepository::new(),
            batches_repository: PgBatchesRepository::new(),
        }
    }
}

#[async_trait]
impl ReceiptsService for PgReceiptsService {
    async fn create_receipt(
        &self,
        receipt: NewImportReceipt,
    ) -> Result<ReceiptDetails, ReceiptsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut created = self.repository.create_receipt(&mut tx, &receipt).await?;

        let mut batches = Vec::with_capacity(receipt.lines.len());
        let mut received_products: Vec<ProductUuid> = Vec::new();

        for line in receipt.lines {
            if !received_products.contains(&line.product_uuid) {
                received_products.push(line.product_uuid);
            }

            let batch = self
                .batches_repository
                .insert_batch(&mut tx, created.id, line)
                .await?;

            batches.push(batch);
        }

        for product in received_products {
            self.batches_repository
                .sync_product_quantity(&mut tx, product)
                .await?;
        }

        created.total_amount = self.repository.update_total(&mut tx, created.id).await?;

        tx.commit().await?;

        Ok(ReceiptDetails {
            receipt: created,
            batches,
        })
    }

    async fn get_receipt(&self, receipt: i64) -> Result<ReceiptDetails, ReceiptsServiceError> {
        let mut tx = self.db.begin().await?;

        let receipt_row = self.repository.get_receipt(&mut tx, receipt).await?;
        let batches = self
            .repository
            .batches_for_receipt(&mut tx, receipt_row.id)
            .await?;

        tx.commit().await?;

        Ok(ReceiptDetails {
            receipt: receipt_row,
            batches,
        })
    }

    async fn list_receipts(&self) -> Result<Vec<ImportReceipt>, ReceiptsServiceError> {
        let mut tx = self.db.begin().await?;

        let receipts = self.repository.list_receipts(&mut tx).await?;

        tx.commit().await?;

        Ok(receipts)
    }

    async fn recalculate_total(&self, receipt: i64) -> Result<u64, ReceiptsServiceError> {
        let mut tx = self.db.begin().await?;

        let total = self.repository.update_total(&mut tx, receipt).await?;

        tx.commit().await?;

        Ok(total)
    }
}

#[automock]
#[async_trait]
pub trait ReceiptsService: Send + Sync {
    /// Posts a receipt: inserts the receipt row and one batch per line, then
    /// resyncs each received product's quantity and the receipt total.
    async fn create_receipt(
        &self,
        receipt: NewImportReceipt,
    ) -> Result<ReceiptDetails, ReceiptsServiceError>;

    /// A receipt with the batches it created.
    async fn get_receipt(&self, receipt: i64) -> Result<ReceiptDetails, ReceiptsServiceError>;

    /// All receipts, newest import first.
    async fn list_receipts(&self) -> Result<Vec<ImportReceipt>, ReceiptsServiceError>;

    /// Recomputes `total_amount` from the receipt's batches. Idempotent.
    async fn recalculate_total(&self, receipt: i64) -> Result<u64, ReceiptsServiceError>;
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use testresult::TestResult;

    use crate::{
        domain::inventory::models::NewBatch,
        domain::products::service::ProductsService,
        test::{
            TestContext,
            helpers::{days_ago, seed_product},
        },
    };

    use super::*;

    fn line(product: ProductUuid, quantity: u64, unit_cost: u64) -> NewBatch {
        NewBatch {
            product_uuid: product,
            batch_code: None,
            import_date: days_ago(1),
            expiry_date: None,
            quantity,
            unit_cost,
            notes: None,
        }
    }

    #[tokio::test]
    async fn create_receipt_posts_batches_and_totals() -> TestResult {
        let ctx = TestContext::new().await;
        let rice = seed_product(&ctx, "Sticky rice", 20_000).await?;
        let tea = seed_product(&ctx, "Green tea", 60_000).await?;

        let details = ctx
            .receipts
            .create_receipt(NewImportReceipt {
                supplier_name: Some("Mekong Farm Co".to_string()),
                import_date: Timestamp::now(),
                created_by: Some("staff-1".to_string()),
                notes: None,
                lines: vec![line(rice, 5, 10_000), line(tea, 10, 20_000)],
            })
            .await?;

        assert_eq!(details.batches.len(), 2);
        assert_eq!(
            details.receipt.total_amount,
            5 * 10_000 + 10 * 20_000,
            "total is the cost-weighted sum of the lines"
        );

        // Each batch starts with its full imported quantity remaining.
        assert!(
            details
                .batches
                .iter()
                .all(|b| b.quantity_remaining == b.quantity_imported),
            "fresh batches must be untouched"
        );

        assert_eq!(ctx.products.get_product(rice).await?.quantity, 5);
        assert_eq!(ctx.products.get_product(tea).await?.quantity, 10);

        Ok(())
    }

    #[tokio::test]
    async fn create_receipt_unknown_product_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx
            .receipts
            .create_receipt(NewImportReceipt {
                supplier_name: None,
                import_date: Timestamp::now(),
                created_by: None,
                notes: None,
                lines: vec![line(ProductUuid::new(), 5, 1_000)],
            })
            .await;

        assert!(
            matches!(result, Err(ReceiptsServiceError::UnknownProduct)),
            "expected UnknownProduct, got {result:?}"
        );
    }

    #[tokio::test]
    async fn create_receipt_duplicate_batch_code_is_rejected() -> TestResult {
        let ctx = TestContext::new().await;
        let product = seed_product(&ctx, "Peanut", 28_000).await?;

        let coded = |code: &str| NewBatch {
            batch_code: Some(code.to_string()),
            ..line(product, 3, 5_000)
        };

        ctx.receipts
            .create_receipt(NewImportReceipt {
                supplier_name: None,
                import_date: Timestamp::now(),
                created_by: None,
                notes: None,
                lines: vec![coded("LOT-001")],
            })
            .await?;

        let result = ctx
            .receipts
            .create_receipt(NewImportReceipt {
                supplier_name: None,
                import_date: Timestamp::now(),
                created_by: None,
                notes: None,
                lines: vec![coded("LOT-001")],
            })
            .await;

        assert!(
            matches!(result, Err(ReceiptsServiceError::DuplicateBatchCode)),
            "expected DuplicateBatchCode, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn get_receipt_unknown_id_returns_not_found() {
        let ctx = TestContext::new().await;

        let result = ctx.receipts.get_receipt(404_404).await;

        assert!(
            matches!(result, Err(ReceiptsServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn recalculate_total_is_idempotent() -> TestResult {
        let ctx = TestContext::new().await;
        let product = seed_product(&ctx, "Durian", 150_000).await?;

        let details = ctx
            .receipts
            .create_receipt(NewImportReceipt {
                supplier_name: None,
                import_date: Timestamp::now(),
                created_by: None,
                notes: None,
                lines: vec![line(product, 4, 90_000)],
            })
            .await?;

        let first = ctx.receipts.recalculate_total(details.receipt.id).await?;
        let second = ctx.receipts.recalculate_total(details.receipt.id).await?;

        assert_eq!(first, 360_000);
        assert_eq!(first, second);

        Ok(())
    }
}
