//! Payment gateway adapters.

mod api_types;
mod mock;
mod pix;
mod signature;

pub use api_types::extract_webhook_payment_id;
pub use mock::MockGateway;
pub use pix::{PixConfig, PixPaymentAdapter};
pub use signature::{verify_webhook_signature, SignatureError, SignatureHeader};
