//! Application layer: the handlers driving the reconciliation engine.

mod create_order;
mod entry_request;
mod reconcile;
mod redrive;

pub use create_order::{CreateOrderCommand, CreateOrderError, CreateOrderHandler, CreateOrderResult};
pub use entry_request::{EntryDecision, EntryRequestError, EntryRequestHandler};
pub use reconcile::{ReconcileError, ReconcileOrderHandler, ReconcileOutcome, ReconcileTrigger};
pub use redrive::{RedriveGrantsHandler, RedriveReport};
