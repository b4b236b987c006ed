//! Cart Models

use jiff::Timestamp;

use crate::domain::products::models::ProductUuid;

/// Cart Model
///
/// One per user, created lazily on first use.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: i64,
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// CartItem Model
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_uuid: ProductUuid,
    pub quantity: u64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
