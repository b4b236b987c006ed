//! Order
//!
//! Status machines for orders and their payments. Orders move forward only
//! (`pending → processing → shipped → completed`), with cancellation allowed
//! from any non-terminal status. Entering `cancelled` or `completed` carries an
//! inventory side effect, which [`OrderStatus::entry_effect`] names so the
//! settlement layer can act on it after persisting the transition.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Placed, not yet picked up by fulfilment.
    Pending,
    /// Being prepared.
    Processing,
    /// Handed to delivery.
    Shipped,
    /// Delivered; sales counters are recorded on entry.
    Completed,
    /// Abandoned; stock is restored on entry.
    Cancelled,
}

/// Inventory side effect triggered by entering a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEffect {
    /// No inventory impact.
    None,
    /// Return the order's quantities to stock.
    RestoreStock,
    /// Increment the sold counter of every ordered product.
    RecordSales,
}

impl OrderStatus {
    /// The lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns `true` once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Whether the status may move to `next`.
    ///
    /// The lifecycle is forward-only; cancellation is reachable from every
    /// non-terminal status, and re-asserting the current status is not a
    /// transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Processing | Self::Cancelled),
            Self::Processing => matches!(next, Self::Shipped | Self::Cancelled),
            Self::Shipped => matches!(next, Self::Completed | Self::Cancelled),
            Self::Completed | Self::Cancelled => false,
        }
    }

    /// The inventory side effect of entering this status.
    #[must_use]
    pub const fn entry_effect(self) -> StatusEffect {
        match self {
            Self::Cancelled => StatusEffect::RestoreStock,
            Self::Completed => StatusEffect::RecordSales,
            Self::Pending | Self::Processing | Self::Shipped => StatusEffect::None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown order status `{0}`")]
pub struct ParseOrderStatusError(String);

impl std::str::FromStr for OrderStatus {
    type Err = ParseOrderStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ParseOrderStatusError(other.to_string())),
        }
    }
}

/// Settlement status of an order's payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Created alongside the order; nothing collected yet.
    Unpaid,
    /// Collected.
    Paid,
    /// Collection failed; may be retried.
    Failed,
    /// Returned to the customer.
    Refunded,
}

impl PaymentStatus {
    /// The lowercase wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }

    /// Whether the status may move to `next`.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        match self {
            Self::Unpaid => matches!(next, Self::Paid | Self::Failed),
            Self::Paid => matches!(next, Self::Refunded),
            Self::Failed => matches!(next, Self::Paid),
            Self::Refunded => false,
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted payment status string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment status `{0}`")]
pub struct ParsePaymentStatusError(String);

impl std::str::FromStr for PaymentStatus {
    type Err = ParsePaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "unpaid" => Ok(Self::Unpaid),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(ParsePaymentStatusError(other.to_string())),
        }
    }
}

/// How the customer pays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Cash on delivery.
    #[default]
    Cod,
    /// Bank transfer before delivery.
    BankTransfer,
}

impl PaymentMethod {
    /// The wire form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted payment method string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown payment method `{0}`")]
pub struct ParsePaymentMethodError(String);

impl std::str::FromStr for PaymentMethod {
    type Err = ParsePaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cod" => Ok(Self::Cod),
            "bank_transfer" => Ok(Self::BankTransfer),
            other => Err(ParsePaymentMethodError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_lifecycle_is_forward_only() {
        use OrderStatus::{Completed, Pending, Processing, Shipped};

        assert!(Pending.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Completed));

        assert!(!Processing.can_transition_to(Pending));
        assert!(!Shipped.can_transition_to(Processing));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Pending.can_transition_to(Pending));
    }

    #[test]
    fn cancellation_is_reachable_until_terminal() {
        use OrderStatus::{Cancelled, Completed, Pending, Processing, Shipped};

        for status in [Pending, Processing, Shipped] {
            assert!(
                status.can_transition_to(Cancelled),
                "{status} should allow cancellation"
            );
        }

        assert!(!Completed.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Pending));
    }

    #[test]
    fn entry_effects_cover_the_two_special_statuses() {
        assert_eq!(
            OrderStatus::Cancelled.entry_effect(),
            StatusEffect::RestoreStock
        );
        assert_eq!(
            OrderStatus::Completed.entry_effect(),
            StatusEffect::RecordSales
        );
        assert_eq!(OrderStatus::Processing.entry_effect(), StatusEffect::None);
    }

    #[test]
    fn order_status_round_trips_through_its_wire_form() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            let parsed: OrderStatus = status.as_str().parse().expect("wire form parses");
            assert_eq!(parsed, status);
        }

        assert!("delivered".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn payment_transitions_allow_retry_after_failure() {
        use PaymentStatus::{Failed, Paid, Refunded, Unpaid};

        assert!(Unpaid.can_transition_to(Paid));
        assert!(Unpaid.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Refunded));

        assert!(!Refunded.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Unpaid));
    }

    #[test]
    fn payment_method_defaults_to_cash_on_delivery() {
        assert_eq!(PaymentMethod::default(), PaymentMethod::Cod);
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().ok(),
            Some(PaymentMethod::BankTransfer)
        );
    }
}
