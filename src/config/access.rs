//! Access granting configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// How confirmed payments turn into access. A deployment decision: every
/// order granted by this instance uses the same strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantMode {
    /// Issue a single-use, expiring invite link and deliver it to the payer.
    #[default]
    InviteLink,

    /// Approve the payer's queued entry request (or pre-authorize a future
    /// one).
    EntryApproval,
}

/// Access granting configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessConfig {
    /// Grant strategy.
    #[serde(default)]
    pub grant_mode: GrantMode,

    /// Interval of the periodic re-drive pass over confirmed-but-ungranted
    /// orders, in seconds. Unset disables the pass; stuck orders then wait
    /// for the next poll or webhook.
    pub redrive_interval_secs: Option<u64>,
}

impl AccessConfig {
    /// Validates access configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(interval) = self.redrive_interval_secs {
            if interval == 0 {
                return Err(ValidationError::InvalidTimeout);
            }
        }
        Ok(())
    }
}
