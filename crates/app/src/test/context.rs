//! Test context for service-level integration tests.

use crate::{
    database::Db,
    domain::{
        carts::PgCartsService, inventory::PgInventoryService, orders::PgOrdersService,
        products::PgProductsService, receipts::PgReceiptsService,
    },
};

use super::db::TestDb;

pub struct TestContext {
    pub db: TestDb,
    pub products: PgProductsService,
    pub inventory: PgInventoryService,
    pub orders: PgOrdersService,
    pub carts: PgCartsService,
    pub receipts: PgReceiptsService,
}

impl TestContext {
    pub async fn new() -> Self {
        let test_db = TestDb::new().await;

        let db = Db::new(test_db.pool().clone());

        Self {
            products: PgProductsService::new(db.clone()),
            inventory: PgInventoryService::new(db.clone()),
            orders: PgOrdersService::new(db.clone()),
            carts: PgCartsService::new(db.clone()),
            receipts: PgReceiptsService::new(db),
            db: test_db,
        }
    }
}
