//! Entry request handler.
//!
//! Entry (join) requests from the messaging platform can arrive before or
//! after payment confirmation. A pre-authorized user is approved on the
//! spot; everyone else is queued until a confirmation arrives and the
//! Access Granter approves them retroactively.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::UserId;
use crate::ports::{
    AuthorityError, EntryRequestTracker, PreauthorizedEntries, ResourceAuthority, TrackerError,
};

/// What happened to an inbound entry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryDecision {
    /// Payment had already been confirmed; approved immediately.
    AutoApproved,

    /// No confirmation yet; queued for a later grant.
    Queued,
}

/// Errors from entry request handling.
#[derive(Debug, Error)]
pub enum EntryRequestError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    Authority(#[from] AuthorityError),
}

/// Handler owning the pending-entry bookkeeping.
pub struct EntryRequestHandler {
    tracker: Arc<dyn EntryRequestTracker>,
    preauthorized: Arc<dyn PreauthorizedEntries>,
    authority: Arc<dyn ResourceAuthority>,
}

impl EntryRequestHandler {
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

    pub async fn handle(&self, user: UserId) -> Result<EntryDecision, EntryRequestError> {
        if self.preauthorized.take(user).await? {
            if let Err(err) = self.authority.approve_entry(user).await {
                // Restore the pre-authorization so a retry can succeed.
                self.preauthorized.add(user).await?;
                return Err(err.into());
            }
            tracing::info!(user_id = %user, "pre-authorized entry approved");
            return Ok(EntryDecision::AutoApproved);
        }

        self.tracker.record_request(user).await?;
        tracing::info!(user_id = %user, "entry request queued awaiting payment");
        Ok(EntryDecision::Queued)
    }
}
