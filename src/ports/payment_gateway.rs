//! Payment gateway port.
//!
//! Contract for the external PIX-style payment processor. Implementations own
//! idempotency-key discipline: every creation call must carry a fresh,
//! request-scoped token so transport retries of one logical creation never
//! produce two billable intents.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::foundation::{Amount, GatewayPaymentId, OrderId};

/// Gateway payment status normalized into the engine's fixed vocabulary.
///
/// Unrecognized raw statuses map to [`NormalizedStatus::Unknown`], which the
/// coordinator finalizes as a closed, non-payable order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizedStatus {
    /// Created, payer has not acted yet.
    Pending,

    /// Payer acted; settlement in flight.
    Processing,

    /// Payment confirmed.
    Approved,

    /// Payment declined or cancelled.
    Rejected,

    /// Payment intent lapsed before the payer paid.
    Expired,

    /// Raw status not in the gateway's documented vocabulary.
    Unknown,
}

impl NormalizedStatus {
    /// Whether the gateway may still confirm this payment later.
    pub fn is_still_open(&self) -> bool {
        matches!(self, NormalizedStatus::Pending | NormalizedStatus::Processing)
    }
}

impl std::fmt::Display for NormalizedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NormalizedStatus::Pending => "pending",
            NormalizedStatus::Processing => "processing",
            NormalizedStatus::Approved => "approved",
            NormalizedStatus::Rejected => "rejected",
            NormalizedStatus::Expired => "expired",
            NormalizedStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// Request to open a payment intent.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntent {
    /// Amount to charge.
    pub amount: Amount,

    /// Human-readable description shown on the payer's statement.
    pub description: String,

    /// Our order id, embedded as the gateway's external reference so
    /// gateway-side records stay correlatable.
    pub order_id: OrderId,

    /// Payer email, when collected.
    pub payer_email: Option<String>,
}

/// What the payer needs in order to complete a PIX payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutPresentation {
    /// The redeemable copy-paste PIX code. Required; a creation response
    /// without it is malformed.
    pub copy_paste_code: String,

    /// Base64-encoded QR image, when the gateway provides one.
    pub qr_code_base64: Option<String>,
}

/// Result of a successful payment intent creation.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    /// Gateway-assigned payment id.
    pub gateway_payment_id: GatewayPaymentId,

    /// Status reported at creation time (normally `pending`).
    pub status: NormalizedStatus,

    /// Payload to present to the payer.
    pub checkout: CheckoutPresentation,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The gateway returned a client error: bad payload, invalid credentials,
    /// unsupported amount. Terminal for this creation attempt; open a new
    /// order instead of retrying.
    #[error("gateway rejected the request ({status}): {detail}")]
    Rejected { status: u16, detail: String },

    /// The success response lacks data needed to present the payment (e.g.
    /// no redeemable code). Terminal for this creation attempt.
    #[error("gateway response malformed: {detail}")]
    MalformedResponse { detail: String },

    /// Transport failure or gateway 5xx. Retryable by the caller; no side
    /// effects are assumed.
    #[error("gateway unavailable: {detail}")]
    Unavailable { detail: String },
}

impl GatewayError {
    /// Creates a rejection error.
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        GatewayError::Rejected {
            status,
            detail: detail.into(),
        }
    }

    /// Creates a malformed-response error.
    pub fn malformed(detail: impl Into<String>) -> Self {
        GatewayError::MalformedResponse {
            detail: detail.into(),
        }
    }

    /// Creates an unavailable error.
    pub fn unavailable(detail: impl Into<String>) -> Self {
        GatewayError::Unavailable {
            detail: detail.into(),
        }
    }

    /// Whether the caller may retry the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Unavailable { .. })
    }
}

/// Port for the external payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Opens a payment intent and returns its id plus the checkout payload.
    ///
    /// Carries a fresh idempotency token per logical creation.
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntent,
    ) -> Result<PaymentIntent, GatewayError>;

    /// Queries the authoritative status of a payment intent.
    async fn get_payment_status(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<NormalizedStatus, GatewayError>;
}
