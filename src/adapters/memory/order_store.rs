//! In-memory implementation of the OrderStore port.
//!
//! Backs tests and development runs. The map lives behind a `Mutex` that is
//! only held inside synchronous critical sections, never across an await,
//! so the conditional-write semantics match the PostgreSQL adapter's
//! conditional UPDATEs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::{GatewayPaymentId, OrderId};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{OrderStore, StoreError};

/// Mutex-guarded map of orders.
#[derive(Default)]
pub struct InMemoryOrderStore {
    orders: Mutex<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn create(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.lock().unwrap();
        if orders.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        Ok(self.orders.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_gateway_payment_id(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<Option<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .find(|o| o.gateway_payment_id.as_ref() == Some(id))
            .cloned())
    }

    async fn record_payment_intent(
        &self,
        id: OrderId,
        gateway_id: &GatewayPaymentId,
    ) -> Result<bool, StoreError> {
        let mut orders = self.orders.lock().unwrap();

        let taken = orders
            .values()
            .any(|o| o.id != id && o.gateway_payment_id.as_ref() == Some(gateway_id));
        if taken {
            return Err(StoreError::DuplicateGatewayPaymentId(gateway_id.clone()));
        }

        let Some(order) = orders.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != OrderStatus::Created || order.gateway_payment_id.is_some() {
            return Ok(false);
        }

        order.gateway_payment_id = Some(gateway_id.clone());
        order.status = OrderStatus::AwaitingPayment;
        Ok(true)
    }

    async fn compare_and_set_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<bool, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != expected || !expected.can_transition_to(new) {
            return Ok(false);
        }
        order.status = new;
        Ok(true)
    }

    async fn mark_granted(&self, id: OrderId) -> Result<bool, StoreError> {
        let mut orders = self.orders.lock().unwrap();
        let Some(order) = orders.get_mut(&id) else {
            return Ok(false);
        };
        if order.status != OrderStatus::Approved || order.granted {
            return Ok(false);
        }
        order.granted = true;
        Ok(true)
    }

    async fn list_approved_ungranted(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .orders
            .lock()
            .unwrap()
            .values()
            .filter(|o| o.needs_grant())
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Amount, PlanId, UserId};
    use rust_decimal_macros::dec;

    fn order() -> Order {
        Order::new(
            UserId::new(42).unwrap(),
            PlanId::new("vip7").unwrap(),
            Amount::new(dec!(9.90)).unwrap(),
            None,
        )
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        assert_eq!(store.get(o.id).await.unwrap().unwrap(), o);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        assert!(matches!(
            store.create(&o).await,
            Err(StoreError::DuplicateOrder(_))
        ));
    }

    #[tokio::test]
    async fn record_payment_intent_sets_id_once_and_advances() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();

        let p1 = GatewayPaymentId::new("P1").unwrap();
        assert!(store.record_payment_intent(o.id, &p1).await.unwrap());

        let stored = store.get(o.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::AwaitingPayment);
        assert_eq!(stored.gateway_payment_id, Some(p1.clone()));

        // Second attempt fails: id is already set and status moved on.
        let p2 = GatewayPaymentId::new("P2").unwrap();
        assert!(!store.record_payment_intent(o.id, &p2).await.unwrap());
        assert_eq!(
            store.get(o.id).await.unwrap().unwrap().gateway_payment_id,
            Some(p1)
        );
    }

    #[tokio::test]
    async fn record_payment_intent_rejects_id_taken_by_another_order() {
        let store = InMemoryOrderStore::new();
        let a = order();
        let b = order();
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();

        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(a.id, &p1).await.unwrap();
        assert!(matches!(
            store.record_payment_intent(b.id, &p1).await,
            Err(StoreError::DuplicateGatewayPaymentId(_))
        ));
    }

    #[tokio::test]
    async fn find_by_gateway_payment_id_resolves_order() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(o.id, &p1).await.unwrap();

        let found = store.find_by_gateway_payment_id(&p1).await.unwrap();
        assert_eq!(found.unwrap().id, o.id);

        let missing = GatewayPaymentId::new("P999").unwrap();
        assert!(store
            .find_by_gateway_payment_id(&missing)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn compare_and_set_wins_once() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(o.id, &p1).await.unwrap();

        assert!(store
            .compare_and_set_status(o.id, OrderStatus::AwaitingPayment, OrderStatus::Approved)
            .await
            .unwrap());
        // The loser of the race observes a failed compare-and-set.
        assert!(!store
            .compare_and_set_status(o.id, OrderStatus::AwaitingPayment, OrderStatus::Rejected)
            .await
            .unwrap());
        assert_eq!(
            store.get(o.id).await.unwrap().unwrap().status,
            OrderStatus::Approved
        );
    }

    #[tokio::test]
    async fn compare_and_set_refuses_backward_edges() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();

        // created -> approved is not on the monotonic path.
        assert!(!store
            .compare_and_set_status(o.id, OrderStatus::Created, OrderStatus::Approved)
            .await
            .unwrap());
        assert_eq!(
            store.get(o.id).await.unwrap().unwrap().status,
            OrderStatus::Created
        );
    }

    #[tokio::test]
    async fn mark_granted_requires_approved_and_applies_once() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        assert!(!store.mark_granted(o.id).await.unwrap());

        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(o.id, &p1).await.unwrap();
        store
            .compare_and_set_status(o.id, OrderStatus::AwaitingPayment, OrderStatus::Approved)
            .await
            .unwrap();

        assert!(store.mark_granted(o.id).await.unwrap());
        assert!(!store.mark_granted(o.id).await.unwrap());
        assert!(store.get(o.id).await.unwrap().unwrap().granted);
    }

    #[tokio::test]
    async fn list_approved_ungranted_feeds_redrive() {
        let store = InMemoryOrderStore::new();
        let o = order();
        store.create(&o).await.unwrap();
        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(o.id, &p1).await.unwrap();
        store
            .compare_and_set_status(o.id, OrderStatus::AwaitingPayment, OrderStatus::Approved)
            .await
            .unwrap();

        let pending = store.list_approved_ungranted().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, o.id);

        store.mark_granted(o.id).await.unwrap();
        assert!(store.list_approved_ungranted().await.unwrap().is_empty());
    }
}
