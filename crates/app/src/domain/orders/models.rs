//! Order Models

use granary::order::{OrderStatus, PaymentMethod, PaymentStatus};
use jiff::Timestamp;

use crate::{domain::products::models::ProductUuid, uuids::TypedUuid};

/// Order UUID
pub type OrderUuid = TypedUuid<Order>;

/// Order Model
#[derive(Debug, Clone)]
pub struct Order {
    pub uuid: OrderUuid,
    pub user_id: String,
    pub total: u64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// OrderItem Model
///
/// Price and quantity are snapshots taken at order time; the product
/// reference is weak and survives product deletion as `None`.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_uuid: OrderUuid,
    pub product_uuid: Option<ProductUuid>,
    pub quantity: u64,
    pub price: u64,
}

/// New Order Model
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub uuid: OrderUuid,
    pub user_id: String,
    pub total: u64,
    pub payment_method: Option<PaymentMethod>,
    pub delivery_address: String,
    pub items: Vec<NewOrderItem>,
}

/// One line of a new order. `cart_item_id` links back to the cart line being
/// purchased so settlement can clear it.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_uuid: ProductUuid,
    pub quantity: u64,
    pub price: u64,
    pub cart_item_id: Option<i64>,
}

/// Payment Model
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: i64,
    pub order_uuid: OrderUuid,
    pub amount: u64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// An order with its items and payment.
#[derive(Debug, Clone)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payment: Option<Payment>,
}

/// The authenticated principal an order operation acts for, as supplied by
/// the auth collaborator. Trusted without re-verification.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user_id: String,
    pub admin: bool,
}

impl Caller {
    #[must_use]
    pub fn customer(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: false,
        }
    }

    #[must_use]
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin: true,
        }
    }
}
