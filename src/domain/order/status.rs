//! Order status machine.
//!
//! Status only ever moves forward along
//! `created → awaiting_payment → {approved | rejected | expired}`, with
//! `error` reachable from the two non-terminal states when payment intent
//! creation fails. Every store adapter consults [`OrderStatus::can_transition_to`]
//! inside its conditional write, so a backward move is unrepresentable through
//! the port.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Persisted, payment intent not yet created.
    Created,

    /// Payment intent open at the gateway; waiting for confirmation.
    AwaitingPayment,

    /// Payment confirmed by the gateway.
    Approved,

    /// Closed without payment (gateway rejected or unrecognized outcome).
    Rejected,

    /// Closed because the payment intent lapsed at the gateway.
    Expired,

    /// Payment intent creation failed; the order is dead.
    Error,
}

impl OrderStatus {
    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Approved | OrderStatus::Rejected | OrderStatus::Expired | OrderStatus::Error
        )
    }

    /// Whether the edge `self → next` is on the monotonic path.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Created, OrderStatus::AwaitingPayment)
                | (OrderStatus::Created, OrderStatus::Error)
                | (OrderStatus::AwaitingPayment, OrderStatus::Approved)
                | (OrderStatus::AwaitingPayment, OrderStatus::Rejected)
                | (OrderStatus::AwaitingPayment, OrderStatus::Expired)
                | (OrderStatus::AwaitingPayment, OrderStatus::Error)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Created => "created",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Approved => "approved",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Expired => "expired",
            OrderStatus::Error => "error",
        };
        write!(f, "{}", s)
    }
}
