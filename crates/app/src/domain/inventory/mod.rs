//! Inventory
//!
//! Batch-level stock. Every write to `batches.quantity_remaining` and to the
//! denormalized `products.quantity` goes through this module so the two stay
//! in sync.

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::InventoryServiceError;
pub use service::*;
