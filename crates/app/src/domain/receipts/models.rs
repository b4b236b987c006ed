//! Import Receipt Models

use jiff::Timestamp;

use crate::domain::inventory::models::{Batch, NewBatch};

/// Import Receipt Model
///
/// One posted delivery of incoming stock. `total_amount` is denormalized from
/// the receipt's batches (`Σ unit_cost × quantity_imported`).
#[derive(Debug, Clone)]
pub struct ImportReceipt {
    pub id: i64,
    pub supplier_name: Option<String>,
    pub total_amount: u64,
    pub import_date: Timestamp,
    pub created_by: Option<String>,
    pub notes: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// New Import Receipt Model
#[derive(Debug, Clone)]
pub struct NewImportReceipt {
    pub supplier_name: Option<String>,
    pub import_date: Timestamp,
    pub created_by: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<NewBatch>,
}

/// A receipt with the batches it created.
#[derive(Debug, Clone)]
pub struct ReceiptDetails {
    pub receipt: ImportReceipt,
    pub batches: Vec<Batch>,
}
