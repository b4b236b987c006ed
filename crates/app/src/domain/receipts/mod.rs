//! Import Receipts

pub mod errors;
pub mod models;
pub(crate) mod repository;
pub mod service;

pub use errors::ReceiptsServiceError;
pub use service::*;
