//! Invite-link grant strategy.
//!
//! Asks the resource authority for a single-use, time-bounded invite and
//! delivers it to the payer. Expiry and use-count live with the issuing
//! authority; this adapter never re-validates them.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::order::Order;
use crate::ports::{AccessGranter, GrantError, GrantOutcome, ResourceAuthority};

/// Grants access by delivering a fresh single-use invite.
pub struct InviteLinkGranter {
    authority: Arc<dyn ResourceAuthority>,
}

impl InviteLinkGranter {
    pub fn new(authority: Arc<dyn ResourceAuthority>) -> Self {
        Self { authority }
    }
}

#[async_trait]
impl AccessGranter for InviteLinkGranter {
    async fn grant(&self, order: &Order) -> Result<GrantOutcome, GrantError> {
        let invite = self
            .authority
            .create_single_use_invite(order.user_id)
            .await
            .map_err(GrantError::new)?;

        self.authority
            .deliver_invite(order.user_id, &invite)
            .await
            .map_err(GrantError::new)?;

        tracing::info!(order_id = %order.id, user_id = %order.user_id, "invite delivered");
        Ok(GrantOutcome::InviteDelivered { invite })
    }
}
