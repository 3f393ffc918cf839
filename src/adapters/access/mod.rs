//! Access granter strategies.
//!
//! Which strategy runs is a deployment decision (`access.grant_mode` in
//! configuration), never an order-level one.

mod entry_approval;
mod invite_link;

pub use entry_approval::EntryApprovalGranter;
pub use invite_link::InviteLinkGranter;
