//! Inventory Models

use granary::ledger::{BatchId, BatchState, Deduction};
use jiff::Timestamp;

use crate::domain::{orders::models::OrderUuid, products::models::ProductUuid};

/// Batch Model
///
/// One receipt line of stock for one product. `quantity_imported` is the
/// immutable historical record; `quantity_remaining` moves within
/// `[0, quantity_imported]`.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: BatchId,
    pub product_uuid: ProductUuid,
    pub import_receipt_id: i64,
    pub batch_code: Option<String>,
    pub import_date: Timestamp,
    pub expiry_date: Option<Timestamp>,
    pub quantity_imported: u64,
    pub quantity_remaining: u64,
    pub unit_cost: u64,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Batch {
    /// The planning view of this batch.
    #[must_use]
    pub fn state(&self) -> BatchState {
        BatchState {
            id: self.id,
            import_date: self.import_date,
            quantity_imported: self.quantity_imported,
            quantity_remaining: self.quantity_remaining,
        }
    }
}

/// New Batch Model
///
/// A line of an import receipt; the batch starts with its full imported
/// quantity remaining.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBatch {
    pub product_uuid: ProductUuid,
    pub batch_code: Option<String>,
    pub import_date: Timestamp,
    pub expiry_date: Option<Timestamp>,
    pub quantity: u64,
    pub unit_cost: u64,
    pub notes: Option<String>,
}

/// A deduction applied on behalf of one order line, kept as the compensation
/// trail of a settlement in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedDeduction {
    pub product: ProductUuid,
    pub deduction: Deduction,
}

/// One batch-level restoration performed while reversing an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoredStock {
    pub order: OrderUuid,
    pub product: ProductUuid,
    pub batch: BatchId,
    pub amount: u64,
}
