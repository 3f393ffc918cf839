//! Re-drive pass for confirmed-but-ungranted orders.
//!
//! A crash between the approved transition and the grant, or a grant-delivery
//! failure, leaves an order `approved, granted = false`. This pass sweeps
//! those orders and re-runs the grant with the same guarded bookkeeping the
//! coordinator uses. Safe to run at any time and at any frequency.

use std::sync::Arc;

use crate::domain::order::Order;
use crate::ports::{AccessGranter, OrderStore, StoreError};

/// Summary of one re-drive sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RedriveReport {
    /// Orders that were in the confirmed-but-ungranted state.
    pub swept: usize,

    /// Orders whose grant completed this pass.
    pub granted: usize,

    /// Orders whose grant failed again and remain queued.
    pub still_ungranted: usize,
}

/// Handler for the periodic re-drive pass.
pub struct RedriveGrantsHandler {
    store: Arc<dyn OrderStore>,
    granter: Arc<dyn AccessGranter>,
}

impl RedriveGrantsHandler {
    pub fn new(store: Arc<dyn OrderStore>, granter: Arc<dyn AccessGranter>) -> Self {
        Self { store, granter }
    }

    pub async fn handle(&self) -> Result<RedriveReport, StoreError> {
        let orders = self.store.list_approved_ungranted().await?;
        let swept = orders.len();
        if swept == 0 {
            return Ok(RedriveReport::default());
        }
        tracing::info!(count = swept, "re-driving confirmed but ungranted orders");

        let results =
            futures::future::join_all(orders.iter().map(|order| self.drive(order))).await;
        let granted = results.iter().filter(|done| **done).count();

        Ok(RedriveReport {
            swept,
            granted,
            still_ungranted: swept - granted,
        })
    }

    async fn drive(&self, order: &Order) -> bool {
        match self.granter.grant(order).await {
            Ok(_) => {
                match self.store.mark_granted(order.id).await {
                    Ok(_) => true,
                    Err(err) => {
                        // The artifact went out; only the flag write failed.
                        // The next sweep repeats the guarded sequence.
                        tracing::error!(order_id = %order.id, error = %err, "mark_granted failed");
                        false
                    }
                }
            }
            Err(err) => {
                tracing::error!(
                    order_id = %order.id,
                    user_id = %order.user_id,
                    error = %err,
                    "grant delivery failed again during re-drive"
                );
                false
            }
        }
    }
}
