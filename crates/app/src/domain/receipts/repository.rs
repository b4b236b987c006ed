//! Import Receipts Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as, query_scalar};

use crate::domain::{
    inventory::models::Batch,
    receipts::models::{ImportReceipt, NewImportReceipt},
    try_get_u64,
};

const CREATE_RECEIPT_SQL: &str = include_str!("sql/create_receipt.sql");
const GET_RECEIPT_SQL: &str = include_str!("sql/get_receipt.sql");
const LIST_RECEIPTS_SQL: &str = include_str!("sql/list_receipts.sql");
const UPDATE_TOTAL_SQL: &str = include_str!("sql/update_total.sql");
const BATCHES_FOR_RECEIPT_SQL: &str = include_str!("sql/batches_for_receipt.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgReceiptsRepository;

impl PgReceiptsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn create_receipt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receipt: &NewImportReceipt,
    ) -> Result<ImportReceipt, sqlx::Error> {
        query_as::<Postgres, ImportReceipt>(CREATE_RECEIPT_SQL)
            .bind(receipt.supplier_name.as_deref())
            .bind(SqlxTimestamp::from(receipt.import_date))
            .bind(receipt.created_by.as_deref())
            .bind(receipt.notes.as_deref())
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn get_receipt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receipt: i64,
    ) -> Result<ImportReceipt, sqlx::Error> {
        query_as::<Postgres, ImportReceipt>(GET_RECEIPT_SQL)
            .bind(receipt)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn list_receipts(
        &self,
        tx: &mut Transaction<'_, Postgres>,
    ) -> Result<Vec<ImportReceipt>, sqlx::Error> {
        query_as::<Postgres, ImportReceipt>(LIST_RECEIPTS_SQL)
            .fetch_all(&mut **tx)
            .await
    }

    /// Rewrite the receipt total from its batches.
    pub(crate) async fn update_total(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receipt: i64,
    ) -> Result<u64, sqlx::Error> {
        let total: i64 = query_scalar(UPDATE_TOTAL_SQL)
            .bind(receipt)
            .fetch_one(&mut **tx)
            .await?;

        u64::try_from(total).map_err(|e| sqlx::Error::ColumnDecode {
            index: "total_amount".to_string(),
            source: Box::new(e),
        })
    }

    pub(crate) async fn batches_for_receipt(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        receipt: i64,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        query_as::<Postgres, Batch>(BATCHES_FOR_RECEIPT_SQL)
            .bind(receipt)
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for ImportReceipt {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            supplier_name: row.try_get("supplier_name")?,
            total_amount: try_get_u64(row, "total_amount")?,
            import_date: row.try_get::<SqlxTimestamp, _>("import_date")?.to_jiff(),
            created_by: row.try_get("created_by")?,
            notes: row.try_get("notes")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
