//! Ports: contracts between the application core and the outside world.
//!
//! Each port is an async trait implemented by one or more adapters. The
//! application layer depends only on these traits.

mod access_granter;
mod entry_tracker;
mod order_store;
mod payment_gateway;
mod resource_authority;

pub use access_granter::{AccessGranter, GrantError, GrantOutcome};
pub use entry_tracker::{EntryRequestTracker, PreauthorizedEntries, TrackerError};
pub use order_store::{OrderStore, StoreError};
pub use payment_gateway::{
    CheckoutPresentation, CreatePaymentIntent, GatewayError, NormalizedStatus, PaymentGateway,
    PaymentIntent,
};
pub use resource_authority::{AuthorityError, InviteLink, ResourceAuthority};
