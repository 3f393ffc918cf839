//! Entry-approval grant strategy.
//!
//! For resources that queue join requests instead of accepting invites: a
//! confirmed payment approves the user's pending request. When no request
//! exists yet, it records a pre-authorization so the future request
//! auto-approves without another payment check.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::order::Order;
use crate::ports::{
    AccessGranter, EntryRequestTracker, GrantError, GrantOutcome, PreauthorizedEntries,
    ResourceAuthority,
};

/// Grants access by approving queued entry requests.
pub struct EntryApprovalGranter {
    tracker: Arc<dyn EntryRequestTracker>,
    preauthorized: Arc<dyn PreauthorizedEntries>,
    authority: Arc<dyn ResourceAuthority>,
}

impl EntryApprovalGranter {
    pub fn new(
        tracker: Arc<dyn EntryRequestTracker>,
        preauthorized: Arc<dyn PreauthorizedEntries>,
        authority: Arc<dyn ResourceAuthority>,
    ) -> Self {
        Self {
            tracker,
            preauthorized,
            authority,
        }
    }
}

#[async_trait]
impl AccessGranter for EntryApprovalGranter {
    async fn grant(&self, order: &Order) -> Result<GrantOutcome, GrantError> {
        let user = order.user_id;

        if self
            .tracker
            .is_pending(user)
            .await
            .map_err(GrantError::new)?
        {
            self.authority
                .approve_entry(user)
                .await
                .map_err(GrantError::new)?;

            // Authorization succeeded; the pending record is spent. A failed
            // clear only risks a redundant approve later, which the authority
            // treats as a no-op.
            if let Err(err) = self.tracker.clear(user).await {
                tracing::warn!(user_id = %user, error = %err, "failed to clear pending entry");
            }

            tracing::info!(order_id = %order.id, user_id = %user, "entry request approved");
            return Ok(GrantOutcome::EntryApproved);
        }

        self.preauthorized
            .add(user)
            .await
            .map_err(GrantError::new)?;
        tracing::info!(order_id = %order.id, user_id = %user, "user pre-authorized for entry");
        Ok(GrantOutcome::PreAuthorized)
    }
}
