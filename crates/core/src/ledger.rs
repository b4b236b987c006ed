//! Ledger
//!
//! Batch-level stock planning. A product's stock is the sum of its batches'
//! remaining quantities; every mutation is expressed as a *plan* computed from
//! immutable batch snapshots, which the storage layer then applies row by row.
//! Planning is separated from application so that a shortfall is detected
//! before any batch is touched.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

/// Identifier of a stock batch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BatchId(i64);

impl BatchId {
    /// Creates a batch id from its storage key.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Returns the underlying storage key.
    #[must_use]
    pub const fn into_inner(self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// Read snapshot of one batch, as loaded from storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchState {
    /// Batch identifier.
    pub id: BatchId,

    /// When the batch was received. Oldest batches are consumed first; ties
    /// break by ascending id so plans are reproducible.
    pub import_date: Timestamp,

    /// Units originally received. Immutable upper bound for restorations.
    pub quantity_imported: u64,

    /// Units still available.
    pub quantity_remaining: u64,
}

impl BatchState {
    /// Units that can still be restored into this batch without exceeding the
    /// originally imported quantity.
    #[must_use]
    pub fn headroom(&self) -> u64 {
        self.quantity_imported.saturating_sub(self.quantity_remaining)
    }
}

/// Sum of remaining quantities across a product's batches.
#[must_use]
pub fn total_remaining(batches: &[BatchState]) -> u64 {
    batches.iter().map(|b| b.quantity_remaining).sum()
}

/// One deduction applied to one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// The batch the units were taken from.
    pub batch: BatchId,

    /// Units taken. Always non-zero.
    pub amount: u64,
}

/// Per-batch breakdown of a stock deduction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeductionPlan {
    deductions: SmallVec<[Deduction; 4]>,
}

impl DeductionPlan {
    /// The per-batch deductions, oldest batch first.
    #[must_use]
    pub fn deductions(&self) -> &[Deduction] {
        &self.deductions
    }

    /// Total units deducted across all batches.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.deductions.iter().map(|d| d.amount).sum()
    }

    /// Returns `true` when the plan touches no batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deductions.is_empty()
    }
}

impl IntoIterator for DeductionPlan {
    type Item = Deduction;
    type IntoIter = smallvec::IntoIter<[Deduction; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.deductions.into_iter()
    }
}

/// One restoration applied to one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restoration {
    /// The batch the units were returned to.
    pub batch: BatchId,

    /// Units returned. Always non-zero.
    pub amount: u64,
}

/// Per-batch breakdown of a stock restoration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestorePlan {
    restorations: SmallVec<[Restoration; 4]>,

    /// Units that could not be placed in any batch without exceeding its
    /// imported quantity.
    unrestored: u64,
}

impl RestorePlan {
    /// The per-batch restorations in application order.
    #[must_use]
    pub fn restorations(&self) -> &[Restoration] {
        &self.restorations
    }

    /// Units that found no batch with headroom.
    #[must_use]
    pub fn unrestored(&self) -> u64 {
        self.unrestored
    }

    /// Total units restored across all batches.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.restorations.iter().map(|r| r.amount).sum()
    }

    /// Returns `true` when the plan touches no batch.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.restorations.is_empty()
    }
}

/// Errors from stock planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The product has no batches at all.
    #[error("no batches available")]
    NoBatches,

    /// The product's batches cannot cover the requested quantity.
    #[error("insufficient stock, short {shortfall} units")]
    Insufficient {
        /// Units still missing after draining every batch.
        shortfall: u64,
    },
}

/// Plans a FIFO stock deduction.
///
/// Batches are consumed oldest `import_date` first (ties broken by ascending
/// id), each contributing `min(remaining, still_needed)` until the request is
/// covered. The input order is irrelevant; the plan is deterministic.
///
/// # Errors
///
/// [`LedgerError::NoBatches`] when `batches` is empty, and
/// [`LedgerError::Insufficient`] (with the shortfall) when the batches cannot
/// cover `needed`. On error no plan is produced, so a partially covering
/// deduction is never applied.
pub fn plan_deduction(batches: &[BatchState], needed: u64) -> Result<DeductionPlan, LedgerError> {
    if batches.is_empty() {
        return Err(LedgerError::NoBatches);
    }

    let mut ordered: SmallVec<[&BatchState; 8]> = batches.iter().collect();
    ordered.sort_by_key(|b| (b.import_date, b.id));

    let mut still_needed = needed;
    let mut deductions = SmallVec::new();

    for batch in ordered {
        if still_needed == 0 {
            break;
        }

        let amount = batch.quantity_remaining.min(still_needed);
        if amount == 0 {
            continue;
        }

        deductions.push(Deduction {
            batch: batch.id,
            amount,
        });
        still_needed -= amount;
    }

    if still_needed > 0 {
        return Err(LedgerError::Insufficient {
            shortfall: still_needed,
        });
    }

    Ok(DeductionPlan { deductions })
}

/// Plans the restoration of cancelled stock.
///
/// Restoration is deliberately asymmetric with deduction: units go back into
/// the *newest* batch first, filling its headroom and spilling the remainder
/// into progressively older batches. Units that fit nowhere are reported as
/// [`RestorePlan::unrestored`] rather than inflating a batch past its imported
/// quantity; an empty batch list yields an empty plan with everything
/// unrestored.
#[must_use]
pub fn plan_cancel_restore(batches: &[BatchState], quantity: u64) -> RestorePlan {
    let mut ordered: SmallVec<[&BatchState; 8]> = batches.iter().collect();
    ordered.sort_by_key(|b| std::cmp::Reverse((b.import_date, b.id)));

    let mut remaining = quantity;
    let mut restorations = SmallVec::new();

    for batch in ordered {
        if remaining == 0 {
            break;
        }

        let amount = batch.headroom().min(remaining);
        if amount == 0 {
            continue;
        }

        restorations.push(Restoration {
            batch: batch.id,
            amount,
        });
        remaining -= amount;
    }

    RestorePlan {
        restorations,
        unrestored: remaining,
    }
}

/// Plans the exact reversal of previously applied deductions.
///
/// Each deducted amount is returned to the batch it came from, clamped to that
/// batch's current headroom. When reversing an uninterleaved deduction the
/// clamp never bites; amounts that no longer fit (or whose batch has
/// disappeared) are reported as [`RestorePlan::unrestored`].
#[must_use]
pub fn plan_compensating_restore(
    batches: &[BatchState],
    deductions: &[Deduction],
) -> RestorePlan {
    // Running headroom per batch; deductions may hit the same batch twice.
    let mut headroom: SmallVec<[(BatchId, u64); 8]> =
        batches.iter().map(|b| (b.id, b.headroom())).collect();

    let mut restorations: SmallVec<[Restoration; 4]> = SmallVec::new();
    let mut unrestored = 0;

    for deduction in deductions {
        let Some(slot) = headroom.iter_mut().find(|(id, _)| *id == deduction.batch) else {
            unrestored += deduction.amount;
            continue;
        };

        let amount = slot.1.min(deduction.amount);
        unrestored += deduction.amount - amount;

        if amount == 0 {
            continue;
        }

        slot.1 -= amount;
        restorations.push(Restoration {
            batch: deduction.batch,
            amount,
        });
    }

    RestorePlan {
        restorations,
        unrestored,
    }
}
