//! Orders service errors.

use granary::order::{OrderStatus, PaymentStatus};
use sqlx::Error;
use thiserror::Error;

use crate::domain::{inventory::errors::InventoryServiceError, products::models::ProductUuid};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order has no items")]
    EmptyOrder,

    #[error("missing delivery address")]
    MissingDeliveryAddress,

    #[error("order not found")]
    NotFound,

    #[error("not allowed to access this order")]
    Forbidden,

    #[error("order cannot move from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    #[error("payment cannot move from {from} to {to}")]
    InvalidPaymentTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    /// A line item's product has no batches at all.
    #[error("product {product} is out of stock")]
    OutOfStock { product: ProductUuid },

    /// A line item's product cannot cover the ordered quantity.
    #[error("product {product} is short {shortfall} units")]
    InsufficientStock {
        product: ProductUuid,
        shortfall: u64,
    },

    #[error("inventory error")]
    Inventory(#[source] InventoryServiceError),

    #[error("storage error")]
    Sql(#[source] Error),
}

impl OrdersServiceError {
    /// Attribute an inventory failure to the line item that caused it.
    pub(crate) fn from_inventory(product: ProductUuid, error: InventoryServiceError) -> Self {
        match error {
            InventoryServiceError::OutOfStock => Self::OutOfStock { product },
            InventoryServiceError::InsufficientStock { shortfall } => Self::InsufficientStock {
                product,
                shortfall,
            },
            other => Self::Inventory(other),
        }
    }
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        Self::Sql(error)
    }
}

impl From<InventoryServiceError> for OrdersServiceError {
    fn from(error: InventoryServiceError) -> Self {
        match error {
            InventoryServiceError::EmptyOrder => Self::EmptyOrder,
            other => Self::Inventory(other),
        }
    }
}
