//! Cart Items Repository

use jiff_sqlx::Timestamp as SqlxTimestamp;
use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query, query_as};

use crate::domain::{
    carts::models::CartItem, encode_u64, products::models::ProductUuid, try_get_u64,
};

const ITEMS_FOR_CART_SQL: &str = include_str!("../sql/items_for_cart.sql");
const UPSERT_CART_ITEM_SQL: &str = include_str!("../sql/upsert_cart_item.sql");
const DELETE_CART_ITEMS_SQL: &str = include_str!("../sql/delete_cart_items.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgCartItemsRepository;

impl PgCartItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn items_for_cart(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart_id: i64,
    ) -> Result<Vec<CartItem>, sqlx::Error> {
        query_as::<Postgres, CartItem>(ITEMS_FOR_CART_SQL)
            .bind(cart_id)
            .fetch_all(&mut **tx)
            .await
    }

    /// Add a product to the cart; an existing line's quantity is increased.
    pub(crate) async fn upsert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        cart_id: i64,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<CartItem, sqlx::Error> {
        let quantity = encode_u64(quantity, "quantity")?;

        query_as::<Postgres, CartItem>(UPSERT_CART_ITEM_SQL)
            .bind(cart_id)
            .bind(product.into_uuid())
            .bind(quantity)
            .fetch_one(&mut **tx)
            .await
    }

    /// Delete cart items by id, scoped to the owning user. Ids belonging to
    /// other users' carts are left untouched.
    pub(crate) async fn delete_items(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        user_id: &str,
        item_ids: &[i64],
    ) -> Result<u64, sqlx::Error> {
        let rows_affected = query(DELETE_CART_ITEMS_SQL)
            .bind(user_id)
            .bind(item_ids)
            .execute(&mut **tx)
            .await?
            .rows_affected();

        Ok(rows_affected)
    }
}

impl<'r> FromRow<'r, PgRow> for CartItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            cart_id: row.try_get("cart_id")?,
            product_uuid: ProductUuid::from_uuid(row.try_get("product_uuid")?),
            quantity: try_get_u64(row, "quantity")?,
            created_at: row.try_get::<SqlxTimestamp, _>("created_at")?.to_jiff(),
            updated_at: row.try_get::<SqlxTimestamp, _>("updated_at")?.to_jiff(),
        })
    }
}
