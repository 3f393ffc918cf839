//! Order store port.
//!
//! Durable record of every purchase attempt. The store exposes conditional
//! write primitives instead of a general update: `compare_and_set_status` is
//! the sole finalization path, which is what gives the engine at-most-once
//! finalization under concurrent reconciliation and keeps it correct across
//! multiple process instances sharing one database.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{GatewayPaymentId, OrderId};
use crate::domain::order::{Order, OrderStatus};

/// Errors from order store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An order with this id already exists.
    #[error("order {0} already exists")]
    DuplicateOrder(OrderId),

    /// The gateway payment id is already attached to another order.
    #[error("gateway payment id {0} already attached to an order")]
    DuplicateGatewayPaymentId(GatewayPaymentId),

    /// Storage backend failure (connection, query, corrupt row).
    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Creates a backend error from any displayable cause.
    pub fn backend(cause: impl ToString) -> Self {
        StoreError::Backend(cause.to_string())
    }
}

/// Port for durable order state.
///
/// Implementations must make every conditional write atomic and isolated per
/// record; no cross-order coordination is required.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persists a new order. The order must be in `created`.
    async fn create(&self, order: &Order) -> Result<(), StoreError>;

    /// Loads an order by id.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Loads an order by the gateway's payment id.
    ///
    /// The webhook path carries only the gateway identifier, so this lookup
    /// is how pushed notifications find their order.
    async fn find_by_gateway_payment_id(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<Option<Order>, StoreError>;

    /// Attaches the gateway payment id and advances `created → awaiting_payment`
    /// in one atomic step.
    ///
    /// Returns `false` without side effects if the order is no longer in
    /// `created` or already carries a gateway id; the id is set at most once.
    async fn record_payment_intent(
        &self,
        id: OrderId,
        gateway_id: &GatewayPaymentId,
    ) -> Result<bool, StoreError>;

    /// Applies `expected → new` only if the stored status still equals
    /// `expected` at write time; otherwise returns `false` with no side
    /// effects.
    ///
    /// A `false` result is not an error: it means another execution already
    /// finalized the order, and the caller must stop.
    async fn compare_and_set_status(
        &self,
        id: OrderId,
        expected: OrderStatus,
        new: OrderStatus,
    ) -> Result<bool, StoreError>;

    /// Sets `granted = true`, guarded: applies only while the order is
    /// `approved` and not yet granted. Returns `false` otherwise.
    async fn mark_granted(&self, id: OrderId) -> Result<bool, StoreError>;

    /// Lists orders confirmed as paid whose access artifact has not been
    /// issued. Feed for the re-drive pass.
    async fn list_approved_ungranted(&self) -> Result<Vec<Order>, StoreError>;
}
