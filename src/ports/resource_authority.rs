//! Resource authority port.
//!
//! The external authority that controls the protected resource; in
//! deployment, the messaging platform's Bot API for the VIP channel. Invite
//! expiry and use-count are enforced by this authority, not re-validated
//! here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Timestamp, UserId};

/// A single-use, time-bounded invitation credential for the protected
/// resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InviteLink {
    /// The invite URL handed to the user.
    pub url: String,

    /// When the issuing authority expires the link.
    pub expires_at: Timestamp,
}

/// Errors from the resource authority.
#[derive(Debug, Clone, Error)]
pub enum AuthorityError {
    /// Transport failure or authority-side outage. Retryable.
    #[error("resource authority unreachable: {0}")]
    Unreachable(String),

    /// The authority refused the call (bad credentials, unknown user, no
    /// pending request on its side).
    #[error("resource authority refused: {0}")]
    Refused(String),
}

impl AuthorityError {
    /// Creates an unreachable error.
    pub fn unreachable(detail: impl ToString) -> Self {
        AuthorityError::Unreachable(detail.to_string())
    }

    /// Creates a refused error.
    pub fn refused(detail: impl ToString) -> Self {
        AuthorityError::Refused(detail.to_string())
    }
}

/// Port for the authority controlling entry to the protected resource.
#[async_trait]
pub trait ResourceAuthority: Send + Sync {
    /// Issues a single-use, expiring invite scoped to the protected resource.
    async fn create_single_use_invite(&self, user: UserId) -> Result<InviteLink, AuthorityError>;

    /// Approves a queued entry request for `user`.
    async fn approve_entry(&self, user: UserId) -> Result<(), AuthorityError>;

    /// Declines a queued entry request for `user`.
    async fn decline_entry(&self, user: UserId) -> Result<(), AuthorityError>;

    /// Delivers an issued invite to the user over the messaging transport.
    async fn deliver_invite(&self, user: UserId, invite: &InviteLink)
        -> Result<(), AuthorityError>;
}
