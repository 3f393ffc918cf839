//! Pending-entry bookkeeping ports.
//!
//! Pure bookkeeping with no payment knowledge: who has asked to enter the
//! protected resource and is waiting, and who has been pre-authorized by a
//! payment that confirmed before any entry request arrived.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::UserId;

/// Errors from tracker operations.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// Storage backend failure.
    #[error("tracker storage failure: {0}")]
    Backend(String),
}

impl TrackerError {
    /// Creates a backend error from any displayable cause.
    pub fn backend(cause: impl ToString) -> Self {
        TrackerError::Backend(cause.to_string())
    }
}

/// Records users whose entry requests arrived before their payment was
/// confirmed.
#[async_trait]
pub trait EntryRequestTracker: Send + Sync {
    /// Records that `user` asked to enter and is awaiting authorization.
    async fn record_request(&self, user: UserId) -> Result<(), TrackerError>;

    /// Whether `user` has an outstanding entry request.
    async fn is_pending(&self, user: UserId) -> Result<bool, TrackerError>;

    /// Clears the record once authorization succeeded or was declined.
    async fn clear(&self, user: UserId) -> Result<(), TrackerError>;
}

/// Records users whose payment confirmed before they requested entry.
#[async_trait]
pub trait PreauthorizedEntries: Send + Sync {
    /// Marks `user` as pre-authorized for their next entry request.
    async fn add(&self, user: UserId) -> Result<(), TrackerError>;

    /// Consumes the pre-authorization for `user`, returning whether one
    /// existed.
    async fn take(&self, user: UserId) -> Result<bool, TrackerError>;
}
