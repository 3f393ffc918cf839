//! Reconciliation coordinator.
//!
//! Confirmation of a payment can arrive through two independent channels: a
//! user-triggered poll and a gateway webhook. Both feed the same reconcile
//! function here, which queries the gateway for authoritative status and then
//! finalizes the order through the store's compare-and-set primitive. Only
//! one of two concurrent callers can win the transition into a terminal
//! state; the loser observes a failed compare-and-set and takes no further
//! action; in particular it never runs the grant.
//!
//! An order found already `approved` but ungranted (crash window, or an
//! earlier grant-delivery failure) re-triggers the grant, so the system is
//! re-drivable from any interruption after the payment was confirmed.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{GatewayPaymentId, OrderId, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::ports::{
    AccessGranter, GatewayError, GrantOutcome, NormalizedStatus, OrderStore, PaymentGateway,
    StoreError,
};

/// The two entry paths into reconciliation.
#[derive(Debug, Clone)]
pub enum ReconcileTrigger {
    /// A user explicitly asked "confirm my payment".
    Poll {
        order_id: OrderId,
        requested_by: UserId,
    },

    /// The gateway pushed a notification carrying only its own payment id.
    Webhook {
        gateway_payment_id: GatewayPaymentId,
    },
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Gateway still reports an open payment; nothing changed.
    NotYetConfirmed { status: NormalizedStatus },

    /// Payment confirmed and the access artifact was issued.
    AccessGranted { grant: GrantOutcome },

    /// Payment confirmed but the access artifact could not be issued; the
    /// order stays `approved, granted = false` for the re-drive pass.
    ConfirmedAwaitingGrant,

    /// The order finalized as closed and non-payable.
    Closed { status: OrderStatus },

    /// Another execution finalized the order first; this caller took no
    /// further action.
    AlreadyFinalized {
        status: OrderStatus,
        granted: bool,
    },

    /// Webhook for a payment id with no matching order; acknowledged and
    /// dropped.
    Discarded,
}

/// Errors surfaced to the poll caller.
///
/// The webhook path logs these and acknowledges anyway; a failed
/// compare-and-set is never an error on either path.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// No order with this id.
    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    /// The poll came from a principal other than the order's owner.
    #[error("order {0} does not belong to the requesting user")]
    NotOrderOwner(OrderId),

    /// The payment intent has not been created yet.
    #[error("order {0} has no payment intent yet")]
    OrderNotReady(OrderId),

    /// The gateway could not be queried; the order is unchanged and the
    /// caller may retry.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The coordinator: single authority for state transitions and grant
/// invocation.
pub struct ReconcileOrderHandler {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    granter: Arc<dyn AccessGranter>,
}

impl ReconcileOrderHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        granter: Arc<dyn AccessGranter>,
    ) -> Self {
        Self {
            store,
            gateway,
            granter,
        }
    }

    /// Runs one reconciliation pass for either trigger.
    pub async fn handle(
        &self,
        trigger: ReconcileTrigger,
    ) -> Result<ReconcileOutcome, ReconcileError> {
        let order = match &trigger {
            ReconcileTrigger::Poll {
                order_id,
                requested_by,
            } => {
                let order = self
                    .store
                    .get(*order_id)
                    .await?
                    .ok_or(ReconcileError::OrderNotFound(*order_id))?;
                if !order.is_owned_by(*requested_by) {
                    return Err(ReconcileError::NotOrderOwner(*order_id));
                }
                order
            }
            ReconcileTrigger::Webhook { gateway_payment_id } => {
                match self
                    .store
                    .find_by_gateway_payment_id(gateway_payment_id)
                    .await?
                {
                    Some(order) => order,
                    None => {
                        // May belong to an unrelated or stale payment.
                        tracing::info!(
                            gateway_payment_id = %gateway_payment_id,
                            "webhook for unknown payment id, discarding"
                        );
                        return Ok(ReconcileOutcome::Discarded);
                    }
                }
            }
        };

        self.reconcile(order).await
    }

    async fn reconcile(&self, order: Order) -> Result<ReconcileOutcome, ReconcileError> {
        match order.status {
            OrderStatus::Created => Err(ReconcileError::OrderNotReady(order.id)),

            // Confirmed earlier but the artifact never went out: re-drive.
            OrderStatus::Approved if !order.granted => self.drive_grant(&order).await,

            OrderStatus::Approved => Ok(ReconcileOutcome::AlreadyFinalized {
                status: OrderStatus::Approved,
                granted: true,
            }),

            OrderStatus::Rejected | OrderStatus::Expired | OrderStatus::Error => {
                Ok(ReconcileOutcome::Closed {
                    status: order.status,
                })
            }

            OrderStatus::AwaitingPayment => self.check_and_finalize(order).await,
        }
    }

    /// The shared query-then-compare-and-set sequence both trigger paths run.
    async fn check_and_finalize(&self, order: Order) -> Result<ReconcileOutcome, ReconcileError> {
        let gateway_id = order
            .gateway_payment_id
            .clone()
            .ok_or(ReconcileError::OrderNotReady(order.id))?;

        let status = self.gateway.get_payment_status(&gateway_id).await?;
        tracing::debug!(
            order_id = %order.id,
            gateway_payment_id = %gateway_id,
            status = ?status,
            "gateway status fetched"
        );

        if status.is_still_open() {
            return Ok(ReconcileOutcome::NotYetConfirmed { status });
        }

        let target = match status {
            NormalizedStatus::Approved => OrderStatus::Approved,
            NormalizedStatus::Expired => OrderStatus::Expired,
            // Rejected, plus anything the gateway vocabulary does not cover:
            // closed and non-payable.
            _ => OrderStatus::Rejected,
        };

        let won = self
            .store
            .compare_and_set_status(order.id, OrderStatus::AwaitingPayment, target)
            .await?;

        if !won {
            // Another execution finalized first; stop without side effects.
            let current = self
                .store
                .get(order.id)
                .await?
                .ok_or(ReconcileError::OrderNotFound(order.id))?;
            return Ok(ReconcileOutcome::AlreadyFinalized {
                status: current.status,
                granted: current.granted,
            });
        }

        if target == OrderStatus::Approved {
            let mut paid = order;
            paid.status = OrderStatus::Approved;
            self.drive_grant(&paid).await
        } else {
            tracing::info!(order_id = %order.id, status = %target, "order closed");
            Ok(ReconcileOutcome::Closed { status: target })
        }
    }

    /// Issues the access artifact, then sets `granted` behind its guard.
    ///
    /// Grant failure is reported, never rolled back: the payment is already
    /// confirmed and must not be dropped.
    async fn drive_grant(&self, order: &Order) -> Result<ReconcileOutcome, ReconcileError> {
        match self.granter.grant(order).await {
            Ok(grant) => {
                let marked = self.store.mark_granted(order.id).await?;
                if !marked {
                    // Another execution completed the grant bookkeeping first.
                    tracing::debug!(order_id = %order.id, "granted flag already set");
                }
                tracing::info!(order_id = %order.id, user_id = %order.user_id, "access granted");
                Ok(ReconcileOutcome::AccessGranted { grant })
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    error = %err,
                    "payment confirmed but grant delivery failed; order awaits re-drive"
                );
                Ok(ReconcileOutcome::ConfirmedAwaitingGrant)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryOrderStore;
    use crate::domain::foundation::{Amount, PlanId, Timestamp};
    use crate::ports::{GrantError, InviteLink};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════
    // Test doubles
    // ════════════════════════════════════════════════════════════════════════

    struct StubGateway {
        status: Mutex<NormalizedStatus>,
        calls: AtomicUsize,
        unavailable: bool,
    }

    impl StubGateway {
        fn reporting(status: NormalizedStatus) -> Self {
            Self {
                status: Mutex::new(status),
                calls: AtomicUsize::new(0),
                unavailable: false,
            }
        }

        fn unavailable() -> Self {
            Self {
                status: Mutex::new(NormalizedStatus::Pending),
                calls: AtomicUsize::new(0),
                unavailable: true,
            }
        }

        fn set_status(&self, status: NormalizedStatus) {
            *self.status.lock().unwrap() = status;
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn create_payment_intent(
            &self,
            _request: crate::ports::CreatePaymentIntent,
        ) -> Result<crate::ports::PaymentIntent, GatewayError> {
            unimplemented!("reconciliation never creates intents")
        }

        async fn get_payment_status(
            &self,
            _id: &GatewayPaymentId,
        ) -> Result<NormalizedStatus, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.unavailable {
                return Err(GatewayError::unavailable("connect timeout"));
            }
            Ok(*self.status.lock().unwrap())
        }
    }

    struct CountingGranter {
        grants: AtomicUsize,
        fail: bool,
    }

    impl CountingGranter {
        fn new() -> Self {
            Self {
                grants: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                grants: AtomicUsize::new(0),
                fail: true,
            }
        }

        fn count(&self) -> usize {
            self.grants.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AccessGranter for CountingGranter {
        async fn grant(&self, _order: &Order) -> Result<GrantOutcome, GrantError> {
            if self.fail {
                return Err(GrantError::new("authority unreachable"));
            }
            self.grants.fetch_add(1, Ordering::SeqCst);
            Ok(GrantOutcome::InviteDelivered {
                invite: InviteLink {
                    url: "https://t.me/+single-use".to_string(),
                    expires_at: Timestamp::now().plus_secs(3600),
                },
            })
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Helpers
    // ════════════════════════════════════════════════════════════════════════

    fn owner() -> UserId {
        UserId::new(42).unwrap()
    }

    async fn awaiting_order(store: &InMemoryOrderStore) -> (Order, GatewayPaymentId) {
        let order = Order::new(
            owner(),
            PlanId::new("vip7").unwrap(),
            Amount::new(dec!(9.90)).unwrap(),
            None,
        );
        store.create(&order).await.unwrap();
        let p1 = GatewayPaymentId::new("P1").unwrap();
        store.record_payment_intent(order.id, &p1).await.unwrap();
        (store.get(order.id).await.unwrap().unwrap(), p1)
    }

    fn handler(
        store: Arc<InMemoryOrderStore>,
        gateway: Arc<StubGateway>,
        granter: Arc<CountingGranter>,
    ) -> ReconcileOrderHandler {
        ReconcileOrderHandler::new(store, gateway, granter)
    }

    fn poll(order: &Order) -> ReconcileTrigger {
        ReconcileTrigger::Poll {
            order_id: order.id,
            requested_by: owner(),
        }
    }

    fn webhook(id: &GatewayPaymentId) -> ReconcileTrigger {
        ReconcileTrigger::Webhook {
            gateway_payment_id: id.clone(),
        }
    }

    // ════════════════════════════════════════════════════════════════════════
    // Poll path
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn poll_on_unknown_order_reports_not_found() {
        let store = Arc::new(InMemoryOrderStore::new());
        let h = handler(
            store,
            Arc::new(StubGateway::reporting(NormalizedStatus::Pending)),
            Arc::new(CountingGranter::new()),
        );

        let result = h
            .handle(ReconcileTrigger::Poll {
                order_id: OrderId::new(),
                requested_by: owner(),
            })
            .await;
        assert!(matches!(result, Err(ReconcileError::OrderNotFound(_))));
    }

    #[tokio::test]
    async fn poll_from_another_user_is_refused() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store,
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            Arc::new(CountingGranter::new()),
        );

        let result = h
            .handle(ReconcileTrigger::Poll {
                order_id: order.id,
                requested_by: UserId::new(7).unwrap(),
            })
            .await;
        assert!(matches!(result, Err(ReconcileError::NotOrderOwner(_))));
    }

    #[tokio::test]
    async fn poll_before_payment_intent_reports_not_ready() {
        let store = Arc::new(InMemoryOrderStore::new());
        let order = Order::new(
            owner(),
            PlanId::new("vip7").unwrap(),
            Amount::new(dec!(9.90)).unwrap(),
            None,
        );
        store.create(&order).await.unwrap();
        let h = handler(
            store,
            Arc::new(StubGateway::reporting(NormalizedStatus::Pending)),
            Arc::new(CountingGranter::new()),
        );

        let result = h.handle(poll(&order)).await;
        assert!(matches!(result, Err(ReconcileError::OrderNotReady(_))));
    }

    #[tokio::test]
    async fn pending_status_leaves_order_unchanged() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Pending)),
            Arc::new(CountingGranter::new()),
        );

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::NotYetConfirmed {
                status: NormalizedStatus::Pending
            }
        );
        assert_eq!(
            store.get(order.id).await.unwrap().unwrap().status,
            OrderStatus::AwaitingPayment
        );
    }

    #[tokio::test]
    async fn approved_status_finalizes_and_grants() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let granter = Arc::new(CountingGranter::new());
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            granter.clone(),
        );

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::AccessGranted { .. }));
        assert_eq!(granter.count(), 1);

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Approved);
        assert!(stored.granted);
    }

    #[tokio::test]
    async fn gateway_unavailable_leaves_order_unchanged() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::unavailable()),
            Arc::new(CountingGranter::new()),
        );

        let result = h.handle(poll(&order)).await;
        assert!(matches!(
            result,
            Err(ReconcileError::Gateway(GatewayError::Unavailable { .. }))
        ));
        assert_eq!(
            store.get(order.id).await.unwrap().unwrap().status,
            OrderStatus::AwaitingPayment
        );
    }

    // ════════════════════════════════════════════════════════════════════════
    // Webhook path
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn webhook_with_unknown_payment_id_is_discarded() {
        let store = Arc::new(InMemoryOrderStore::new());
        let granter = Arc::new(CountingGranter::new());
        let h = handler(
            store,
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            granter.clone(),
        );

        let outcome = h
            .handle(webhook(&GatewayPaymentId::new("P404").unwrap()))
            .await
            .unwrap();
        assert_eq!(outcome, ReconcileOutcome::Discarded);
        assert_eq!(granter.count(), 0);
    }

    #[tokio::test]
    async fn duplicate_webhook_after_grant_takes_no_action() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (_, p1) = awaiting_order(&store).await;
        let granter = Arc::new(CountingGranter::new());
        let h = handler(
            store,
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            granter.clone(),
        );

        let first = h.handle(webhook(&p1)).await.unwrap();
        assert!(matches!(first, ReconcileOutcome::AccessGranted { .. }));

        let second = h.handle(webhook(&p1)).await.unwrap();
        assert_eq!(
            second,
            ReconcileOutcome::AlreadyFinalized {
                status: OrderStatus::Approved,
                granted: true,
            }
        );
        assert_eq!(granter.count(), 1);
    }

    // ════════════════════════════════════════════════════════════════════════
    // Races and finalization mapping
    // ════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn concurrent_poll_and_webhook_grant_exactly_once() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, p1) = awaiting_order(&store).await;
        let granter = Arc::new(CountingGranter::new());
        let h = Arc::new(handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            granter.clone(),
        ));

        let (a, b) = tokio::join!(h.handle(poll(&order)), h.handle(webhook(&p1)));
        let (a, b) = (a.unwrap(), b.unwrap());

        let granted = [&a, &b]
            .iter()
            .filter(|o| matches!(o, ReconcileOutcome::AccessGranted { .. }))
            .count();
        assert_eq!(granted, 1, "exactly one caller wins the grant: {:?} / {:?}", a, b);
        assert_eq!(granter.count(), 1);

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Approved);
        assert!(stored.granted);
    }

    #[tokio::test]
    async fn rejected_status_closes_the_order() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let gateway = Arc::new(StubGateway::reporting(NormalizedStatus::Rejected));
        let granter = Arc::new(CountingGranter::new());
        let h = handler(store.clone(), gateway.clone(), granter.clone());

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Closed {
                status: OrderStatus::Rejected
            }
        );
        assert_eq!(granter.count(), 0);

        // A later poll reports the terminal state from the store alone.
        let again = h.handle(poll(&order)).await.unwrap();
        assert_eq!(
            again,
            ReconcileOutcome::Closed {
                status: OrderStatus::Rejected
            }
        );
        assert_eq!(gateway.calls(), 1, "terminal orders are not re-queried");
    }

    #[tokio::test]
    async fn expired_status_closes_as_expired() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Expired)),
            Arc::new(CountingGranter::new()),
        );

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Closed {
                status: OrderStatus::Expired
            }
        );
    }

    #[tokio::test]
    async fn unknown_status_closes_as_rejected() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Unknown)),
            Arc::new(CountingGranter::new()),
        );

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert_eq!(
            outcome,
            ReconcileOutcome::Closed {
                status: OrderStatus::Rejected
            }
        );
    }

    #[tokio::test]
    async fn grant_failure_keeps_order_redrivable() {
        let store = Arc::new(InMemoryOrderStore::new());
        let (order, _) = awaiting_order(&store).await;
        let h = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            Arc::new(CountingGranter::failing()),
        );

        let outcome = h.handle(poll(&order)).await.unwrap();
        assert_eq!(outcome, ReconcileOutcome::ConfirmedAwaitingGrant);

        let stored = store.get(order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Approved);
        assert!(!stored.granted, "grant failure must not mark granted");

        // A later poll with a healthy granter completes the grant.
        let granter = Arc::new(CountingGranter::new());
        let retry = handler(
            store.clone(),
            Arc::new(StubGateway::reporting(NormalizedStatus::Approved)),
            granter.clone(),
        );
        let outcome = retry.handle(poll(&order)).await.unwrap();
        assert!(matches!(outcome, ReconcileOutcome::AccessGranted { .. }));
        assert_eq!(granter.count(), 1);
        assert!(store.get(order.id).await.unwrap().unwrap().granted);
    }
}
