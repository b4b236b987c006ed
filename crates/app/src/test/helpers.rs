//! Test Helpers

use jiff::{Timestamp, ToSpan};

use crate::{
    domain::{
        inventory::models::{Batch, NewBatch},
        orders::models::{NewOrder, NewOrderItem, OrderUuid},
        products::{
            ProductsService, ProductsServiceError,
            models::{NewProduct, ProductUuid},
        },
        receipts::{ReceiptsService, ReceiptsServiceError, models::NewImportReceipt},
    },
    test::TestContext,
};

pub(crate) fn days_ago(days: i64) -> Timestamp {
    Timestamp::now()
        .checked_sub(days.days())
        .expect("timestamp in range")
}

pub(crate) fn new_product(uuid: ProductUuid, name: &str, price: u64) -> NewProduct {
    NewProduct {
        uuid,
        name: name.to_string(),
        description: None,
        price,
        unit: None,
        origin: None,
    }
}

pub(crate) async fn seed_product(
    ctx: &TestContext,
    name: &str,
    price: u64,
) -> Result<ProductUuid, ProductsServiceError> {
    let uuid = ProductUuid::new();

    ctx.products
        .create_product(new_product(uuid, name, price))
        .await?;

    Ok(uuid)
}

/// Post one import receipt whose lines are `(days_ago, quantity)` pairs for
/// the given product. Batches come back oldest import first.
pub(crate) async fn seed_batches(
    ctx: &TestContext,
    product: ProductUuid,
    lines: &[(i64, u64)],
) -> Result<Vec<Batch>, ReceiptsServiceError> {
    let details = ctx
        .receipts
        .create_receipt(NewImportReceipt {
            supplier_name: None,
            import_date: Timestamp::now(),
            created_by: None,
            notes: None,
            lines: lines
                .iter()
                .map(|&(days, quantity)| NewBatch {
                    product_uuid: product,
                    batch_code: None,
                    import_date: days_ago(days),
                    expiry_date: None,
                    quantity,
                    unit_cost: 10_000,
                    notes: None,
                })
                .collect(),
        })
        .await?;

    let mut batches = details.batches;
    batches.sort_by_key(|b| (b.import_date, b.id));

    Ok(batches)
}

pub(crate) fn order_line(product: ProductUuid, quantity: u64, price: u64) -> NewOrderItem {
    NewOrderItem {
        product_uuid: product,
        quantity,
        price,
        cart_item_id: None,
    }
}

pub(crate) fn new_order(user_id: &str, items: Vec<NewOrderItem>) -> NewOrder {
    let total = items
        .iter()
        .map(|line| line.quantity * line.price)
        .sum();

    NewOrder {
        uuid: OrderUuid::new(),
        user_id: user_id.to_string(),
        total,
        payment_method: None,
        delivery_address: "12 Market Street".to_string(),
        items,
    }
}
