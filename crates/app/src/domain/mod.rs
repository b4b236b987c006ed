//! Granary Domain Concerns

use sqlx::{Row, postgres::PgRow};

pub mod carts;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod receipts;

/// Decode a non-negative `BIGINT` column into a `u64`.
pub(crate) fn try_get_u64(row: &PgRow, column: &str) -> sqlx::Result<u64> {
    let value: i64 = row.try_get(column)?;

    u64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

/// Encode a `u64` for a `BIGINT` bind parameter.
pub(crate) fn encode_u64(value: u64, column: &str) -> sqlx::Result<i64> {
    i64::try_from(value).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}
