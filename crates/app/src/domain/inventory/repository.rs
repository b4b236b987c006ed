//! Batches Repository

use granary::ledger::BatchId;
use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as, query_scalar};
use uuid::Uuid;

use crate::domain::{
    encode_u64,
    inventory::models::{Batch, NewBatch},
    orders::models::OrderUuid,
    products::models::ProductUuid,
    try_get_u64,
};

const BATCHES_FOR_PRODUCT_SQL: &str = include_str!("sql/batches_for_product.sql");
const GET_BATCH_SQL: &str = include_str!("sql/get_batch.sql");
const INSERT_BATCH_SQL: &str = include_str!("sql/insert_batch.sql");
const SET_BATCH_REMAINING_SQL: &str = include_str!("sql/set_batch_remaining.sql");
const ADJUST_BATCH_REMAINING_SQL: &str = include_str!("sql/adjust_batch_remaining.sql");
const TOTAL_REMAINING_SQL: &str = include_str!("sql/total_remaining.sql");
const SYNC_PRODUCT_QUANTITY_SQL: &str = include_str!("sql/sync_product_quantity.sql");
const ORDER_QUANTITIES_SQL: &str = include_str!("sql/order_quantities.sql");

/// One `(product, quantity)` line of an order, as seen by stock restoration.
/// The product reference is weak and may be gone.
#[derive(Debug, Clone, Copy)]
pub(crate) struct OrderQuantity {
    pub(crate) product: Option<ProductUuid>,
    pub(crate) quantity: u64,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct PgBatchesRepository;

impl PgBatchesRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    /// All batches of a product, oldest import first (ties by id).
    pub(crate) async fn batches_for_product(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        query_as::<Postgres, Batch>(BATCHES_FOR_PRODUCT_SQL)
            .bind(product.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }

    pub(crate) async fn get_batch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch: BatchId,
    ) -> Result<Batch, sqlx::Error> {
        query_as::<Postgres, Batch>(GET_BATCH_SQL)
            .bind(batch.into_inner())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn insert_batch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        import_receipt_id: i64,
        batch: NewBatch,
    ) -> Result<Batch, sqlx::Error> {
        let quantity = encode_u64(batch.quantity, "quantity_imported")?;
        let unit_cost = encode_u64(batch.unit_cost, "unit_cost")?;

        query_as::<Postgres, Batch>(INSERT_BATCH_SQL)
            .bind(batch.product_uuid.into_uuid())
            .bind(import_receipt_id)
            .bind(batch.batch_code)
            .bind(SqlxTimestamp::from(batch.import_date))
            .bind(batch.expiry_date.map(SqlxTimestamp::from))
            .bind(quantity)
            .bind(unit_cost)
            .bind(batch.notes)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn set_batch_remaining(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch: BatchId,
        remaining: u64,
    ) -> Result<Batch, sqlx::Error> {
        let remaining = encode_u64(remaining, "quantity_remaining")?;

        query_as::<Postgres, Batch>(SET_BATCH_REMAINING_SQL)
            .bind(batch.into_inner())
            .bind(remaining)
            .fetch_one(&mut **tx)
            .await
    }

    /// Apply a signed delta to one batch's remaining quantity. The plans this
    /// repository applies never leave `[0, quantity_imported]`; the table's
    /// check constraint backs that up.
    pub(crate) async fn adjust_batch_remaining(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch: BatchId,
        delta: i64,
    ) -> Result<Batch, sqlx::Error> {
        query_as::<Postgres, Batch>(ADJUST_BATCH_REMAINING_SQL)
            .bind(batch.into_inner())
            .bind(delta)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn total_remaining(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let total: i64 = query_scalar(TOTAL_REMAINING_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(total).map_err(|e| sqlx::Error::ColumnDecode {
            index: "total".to_string(),
            source: Box::new(e),
        })
    }

    /// Rewrite the denormalized product quantity from the batch sum.
    pub(crate) async fn sync_product_quantity(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product: ProductUuid,
    ) -> Result<u64, sqlx::Error> {
        let quantity: i64 = query_scalar(SYNC_PRODUCT_QUANTITY_SQL)
            .bind(product.into_uuid())
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(quantity).map_err(|e| sqlx::Error::ColumnDecode {
            index: "quantity".to_string(),
            source: Box::new(e),
        })
    }

    /// The `(product, quantity)` lines of an order, for restoration.
    pub(crate) async fn order_quantities(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderQuantity>, sqlx::Error> {
        let rows = query(ORDER_QUANTITIES_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(OrderQuantity {
                    product: row
                        .try_get::<Option<Uuid>, _>("product_uuid")?
                        .map(ProductUuid::from_uuid),
                    quantity: try_get_u64(row, "quantity")?,
                })
            })
            .collect()
    }
}

impl<'r> FromRow<'r, PgRow> for Batch {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: BatchId::new(row.try_get("id")?),
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            import_receipt_id: row.try_get("import_receipt_id")?,
            batch_code: row.try_get("batch_code")?,
            import_date: row.try_get::<SqlxTimestamp, _>("import_date")?.to_jiff(),
            expiry_date: row
                .try_get::<Option<SqlxTimestamp>, _>("expiry_date")?
                .map(SqlxTimestamp::to_jiff),
            quantity_imported: try_get_u64(row, "quantity_imported")?,
            quantity_remaining: try_get_u64(row, "quantity_remaining")?,
            unit_cost: try_get_u64(row, "unit_cost")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
