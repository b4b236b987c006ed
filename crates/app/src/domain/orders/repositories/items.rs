//! Order Items Repository

use sqlx::{FromRow, Postgres, Row, Transaction, postgres::PgRow, query_as};
use uuid::Uuid;

use crate::domain::{
    encode_u64,
    orders::models::{NewOrderItem, OrderItem, OrderUuid},
    products::models::ProductUuid,
    try_get_u64,
};

const INSERT_ORDER_ITEM_SQL: &str = include_str!("../sql/insert_order_item.sql");
const ITEMS_FOR_ORDER_SQL: &str = include_str!("../sql/items_for_order.sql");

#[derive(Debug, Clone, Default)]
pub(crate) struct PgOrderItemsRepository;

impl PgOrderItemsRepository {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) async fn insert_item(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
        item: &NewOrderItem,
    ) -> Result<OrderItem, sqlx::Error> {
        let quantity = encode_u64(item.quantity, "quantity")?;
        let price = encode_u64(item.price, "price")?;

        query_as::<Postgres, OrderItem>(INSERT_ORDER_ITEM_SQL)
            .bind(order.into_uuid())
            .bind(item.product_uuid.into_uuid())
            .bind(quantity)
            .bind(price)
            .fetch_one(&mut **tx)
            .await
    }

    pub(crate) async fn items_for_order(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: OrderUuid,
    ) -> Result<Vec<OrderItem>, sqlx::Error> {
        query_as::<Postgres, OrderItem>(ITEMS_FOR_ORDER_SQL)
            .bind(order.into_uuid())
            .fetch_all(&mut **tx)
            .await
    }
}

impl<'r> FromRow<'r, PgRow> for OrderItem {
    fn from_row(row: &'r PgRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            order_uuid: OrderUuid::from_uuid(row.try_get("order_uuid")?),
            product_uuid: row
                .try_get::<Option<Uuid>, _>("product_uuid")?
                .map(ProductUuid::from_uuid),
            quantity: try_get_u64(row, "quantity")?,
            price: try_get_u64(row, "price")?,
        })
    }
}
