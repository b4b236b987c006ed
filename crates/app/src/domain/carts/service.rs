//! Carts service.

use async_trait::async_trait;
use mockall::automock;

use crate::{
    database::Db,
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{Cart, CartItem},
            repositories::{PgCartItemsRepository, PgCartsRepository},
        },
        products::models::ProductUuid,
    },
};

#[derive(Debug, Clone)]
pub struct PgCartsService {
    db: Db,
    carts_repository: PgCartsRepository,
    items_repository: PgCartItemsRepository,
}

impl PgCartsService {
    #[must_use]
    pub fn new(db: Db) -> Self {
        Self {
            db,
            carts_repository: PgCartsRepository::new(),
            items_repository: PgCartItemsRepository::new(),
        }
    }
}

#[async_trait]
impl CartsService for PgCartsService {
    async fn get_cart(&self, user_id: &str) -> Result<Cart, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let mut cart = self.carts_repository.upsert_cart(&mut tx, user_id).await?;
        let items = self.items_repository.items_for_cart(&mut tx, cart.id).await?;

        tx.commit().await?;

        cart.items.extend(items);

        Ok(cart)
    }

    async fn add_item(
        &self,
        user_id: &str,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<CartItem, CartsServiceError> {
        let mut tx = self.db.begin().await?;

        let cart = self.carts_repository.upsert_cart(&mut tx, user_id).await?;
        let item = self
            .items_repository
            .upsert_item(&mut tx, cart.id, product, quantity)
            .await?;

        tx.commit().await?;

        Ok(item)
    }

    async fn remove_items(
        &self,
        user_id: &str,
        item_ids: &[i64],
    ) -> Result<u64, CartsServiceError> {
        if item_ids.is_empty() {
            return Ok(0);
        }

        let mut tx = self.db.begin().await?;

        let removed = self
            .items_repository
            .delete_items(&mut tx, user_id, item_ids)
            .await?;

        tx.commit().await?;

        Ok(removed)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// The user's cart with its items, created on first use.
    async fn get_cart(&self, user_id: &str) -> Result<Cart, CartsServiceError>;

    /// Add a product to the user's cart; an existing line's quantity is
    /// increased.
    async fn add_item(
        &self,
        user_id: &str,
        product: ProductUuid,
        quantity: u64,
    ) -> Result<CartItem, CartsServiceError>;

    /// Delete cart items by id, scoped to the user. Returns the deleted
    /// count; ids the user does not own are ignored.
    async fn remove_items(&self, user_id: &str, item_ids: &[i64])
    -> Result<u64, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::test::{TestContext, helpers::seed_product};

    use super::*;

    #[tokio::test]
    async fn get_cart_creates_an_empty_cart_on_first_use() -> TestResult {
        let ctx = TestContext::new().await;

        let cart = ctx.carts.get_cart("user-a").await?;

        assert_eq!(cart.user_id, "user-a");
        assert!(cart.items.is_empty());

        let again = ctx.carts.get_cart("user-a").await?;
        assert_eq!(again.id, cart.id, "the cart row is reused");

        Ok(())
    }

    #[tokio::test]
    async fn add_item_accumulates_quantity_for_the_same_product() -> TestResult {
        let ctx = TestContext::new().await;
        let product = seed_product(&ctx, "Guava", 14_000).await?;

        ctx.carts.add_item("user-a", product, 2).await?;
        let item = ctx.carts.add_item("user-a", product, 3).await?;

        assert_eq!(item.quantity, 5);

        let cart = ctx.carts.get_cart("user-a").await?;
        assert_eq!(cart.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn add_item_unknown_product_is_rejected() {
        let ctx = TestContext::new().await;

        let result = ctx.carts.add_item("user-a", ProductUuid::new(), 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::UnknownProduct)),
            "expected UnknownProduct, got {result:?}"
        );
    }

    #[tokio::test]
    async fn remove_items_only_touches_the_callers_cart() -> TestResult {
        let ctx = TestContext::new().await;
        let product = seed_product(&ctx, "Rambutan", 35_000).await?;

        let mine = ctx.carts.add_item("user-a", product, 1).await?;
        let theirs = ctx.carts.add_item("user-b", product, 1).await?;

        let removed = ctx
            .carts
            .remove_items("user-a", &[mine.id, theirs.id])
            .await?;

        assert_eq!(removed, 1, "only the caller's item is deleted");
        assert_eq!(ctx.carts.get_cart("user-b").await?.items.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn remove_items_with_no_ids_is_a_noop() -> TestResult {
        let ctx = TestContext::new().await;

        assert_eq!(ctx.carts.remove_items("user-a", &[]).await?, 0);

        Ok(())
    }
}
