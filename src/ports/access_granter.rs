//! Access granter port.
//!
//! Issues the concrete access artifact once an order is finalized as paid.
//! The strategy (invite delivery vs. entry-request approval) is a deployment
//! decision, not an order-level one. A grant failure must never roll back
//! confirmed payment state; the order stays `approved, granted = false` and
//! is completed by a later re-drive.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::order::Order;

use super::resource_authority::InviteLink;

/// What the granter did for a confirmed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrantOutcome {
    /// A single-use invite was issued and delivered to the user.
    InviteDelivered { invite: InviteLink },

    /// The user's queued entry request was approved.
    EntryApproved,

    /// No entry request existed yet; the user was recorded as pre-authorized
    /// so a future request auto-approves.
    PreAuthorized,
}

/// The access artifact could not be issued or delivered.
///
/// The payment behind it is already confirmed, so this error is reported and
/// retried. It is never swallowed and never a reason to roll back.
#[derive(Debug, Clone, Error)]
#[error("access grant delivery failed: {detail}")]
pub struct GrantError {
    /// What went wrong, for the operator log.
    pub detail: String,
}

impl GrantError {
    /// Creates a grant error from any displayable cause.
    pub fn new(detail: impl ToString) -> Self {
        Self {
            detail: detail.to_string(),
        }
    }
}

/// Port for issuing access artifacts.
#[async_trait]
pub trait AccessGranter: Send + Sync {
    /// Issues the access artifact for a paid order.
    async fn grant(&self, order: &Order) -> Result<GrantOutcome, GrantError>;
}
