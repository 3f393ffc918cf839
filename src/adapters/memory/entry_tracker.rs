//! In-memory implementation of the entry bookkeeping ports.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::foundation::UserId;
use crate::ports::{EntryRequestTracker, PreauthorizedEntries, TrackerError};

/// Mutex-guarded sets of pending and pre-authorized users.
#[derive(Default)]
pub struct InMemoryEntryTracker {
    pending: Mutex<HashSet<UserId>>,
    preauthorized: Mutex<HashSet<UserId>>,
}

impl InMemoryEntryTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntryRequestTracker for InMemoryEntryTracker {
    async fn record_request(&self, user: UserId) -> Result<(), TrackerError> {
        self.pending.lock().unwrap().insert(user);
        Ok(())
    }

    async fn is_pending(&self, user: UserId) -> Result<bool, TrackerError> {
        Ok(self.pending.lock().unwrap().contains(&user))
    }

    async fn clear(&self, user: UserId) -> Result<(), TrackerError> {
        self.pending.lock().unwrap().remove(&user);
        Ok(())
    }
}

#[async_trait]
impl PreauthorizedEntries for InMemoryEntryTracker {
    async fn add(&self, user: UserId) -> Result<(), TrackerError> {
        self.preauthorized.lock().unwrap().insert(user);
        Ok(())
    }

    async fn take(&self, user: UserId) -> Result<bool, TrackerError> {
        Ok(self.preauthorized.lock().unwrap().remove(&user))
    }
}
