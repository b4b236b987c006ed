//! App Context

use std::sync::Arc;

use thiserror::Error;

use crate::{
    database::{self, Db},
    domain::{
        carts::{CartsService, PgCartsService},
        inventory::{InventoryService, PgInventoryService},
        orders::{OrdersService, PgOrdersService},
        products::{PgProductsService, ProductsService},
        receipts::{PgReceiptsService, ReceiptsService},
    },
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("failed to connect to database")]
    Database(#[source] sqlx::Error),
}

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub inventory: Arc<dyn InventoryService>,
    pub orders: Arc<dyn OrdersService>,
    pub carts: Arc<dyn CartsService>,
    pub receipts: Arc<dyn ReceiptsService>,
}

impl AppContext {
    /// Build application context from a database URL.
    ///
    /// # Errors
    ///
    /// Returns an error when establishing a database connection fails.
    pub async fn from_database_url(url: &str) -> Result<Self, AppInitError> {
        let pool = database::connect(url)
            .await
            .map_err(AppInitError::Database)?;

        let db = Db::new(pool);

        Ok(Self {
            products: Arc::new(PgProductsService::new(db.clone())),
            inventory: Arc::new(PgInventoryService::new(db.clone())),
            orders: Arc::new(PgOrdersService::new(db.clone())),
            carts: Arc::new(PgCartsService::new(db.clone())),
            receipts: Arc::new(PgReceiptsService::new(db)),
        })
    }
}
