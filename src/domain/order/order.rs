//! Order aggregate.
//!
//! An order records one purchase attempt: who is buying, which plan, the
//! price frozen at creation time, and where the attempt stands against the
//! payment gateway. The aggregate itself is plain data plus invariant
//! helpers; all finalizing writes go through the store's compare-and-set
//! primitives, never through in-place mutation.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Amount, GatewayPaymentId, OrderId, PlanId, Timestamp, UserId};

use super::OrderStatus;

/// A single purchase attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique id, generated at creation.
    pub id: OrderId,

    /// Principal who opened the order.
    pub user_id: UserId,

    /// Catalog plan being purchased.
    pub plan_id: PlanId,

    /// Price at creation time; immutable thereafter.
    pub amount: Amount,

    /// Payer email forwarded to the gateway, when the user supplied one.
    pub payer_email: Option<String>,

    /// Gateway-assigned payment id; set at most once, never changed.
    pub gateway_payment_id: Option<GatewayPaymentId>,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// True once the access artifact has been issued for this order.
    pub granted: bool,

    /// When the order was created.
    pub created_at: Timestamp,
}

impl Order {
    /// Creates a fresh order in `created` with no gateway payment attached.
    pub fn new(user_id: UserId, plan_id: PlanId, amount: Amount, payer_email: Option<String>) -> Self {
        Self {
            id: OrderId::new(),
            user_id,
            plan_id,
            amount,
            payer_email,
            gateway_payment_id: None,
            status: OrderStatus::Created,
            granted: false,
            created_at: Timestamp::now(),
        }
    }

    /// Whether `user` is the principal who opened this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.user_id == user
    }

    /// Whether the payment was confirmed but the access artifact has not been
    /// issued yet. These orders are picked up by the re-drive pass.
    pub fn needs_grant(&self) -> bool {
        self.status == OrderStatus::Approved && !self.granted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_order() -> Order {
        Order::new(
            UserId::new(42).unwrap(),
            PlanId::new("vip7").unwrap(),
            Amount::new(dec!(9.90)).unwrap(),
            Some("payer@example.com".to_string()),
        )
    }

    #[test]
    fn new_order_starts_created_and_ungranted() {
        let order = sample_order();
        assert_eq!(order.status, OrderStatus::Created);
        assert!(!order.granted);
        assert!(order.gateway_payment_id.is_none());
    }

    #[test]
    fn ownership_check_matches_creator_only() {
        let order = sample_order();
        assert!(order.is_owned_by(UserId::new(42).unwrap()));
        assert!(!order.is_owned_by(UserId::new(7).unwrap()));
    }

    #[test]
    fn needs_grant_only_when_approved_and_ungranted() {
        let mut order = sample_order();
        assert!(!order.needs_grant());

        order.status = OrderStatus::Approved;
        assert!(order.needs_grant());

        order.granted = true;
        assert!(!order.needs_grant());
    }
}
