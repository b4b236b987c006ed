//! Product Models

use jiff::Timestamp;

use crate::uuids::TypedUuid;

/// Product UUID
pub type ProductUuid = TypedUuid<Product>;

/// Product Model
///
/// `quantity` is denormalized: it mirrors the sum of the product's batch
/// remainders and is written only by the inventory service. `sold` counts the
/// units of completed orders.
#[derive(Debug, Clone)]
pub struct Product {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub unit: Option<String>,
    pub quantity: u64,
    pub sold: u64,
    pub origin: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}

/// New Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub uuid: ProductUuid,
    pub name: String,
    pub description: Option<String>,
    pub price: u64,
    pub unit: Option<String>,
    pub origin: Option<String>,
}

/// Product Update Model
///
/// Unset fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<u64>,
    pub unit: Option<String>,
    pub origin: Option<String>,
}
