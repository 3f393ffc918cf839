//! Request/response DTOs for the HTTP API.

use serde::{Deserialize, Serialize};

use crate::application::ReconcileOutcome;
use crate::domain::order::Order;
use crate::ports::GrantOutcome;

/// POST /api/orders request body.
#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    /// Messaging-platform user id of the buyer.
    pub user_id: i64,

    /// Catalog plan key.
    pub plan_id: String,

    /// Payer email forwarded to the gateway.
    pub payer_email: Option<String>,
}

/// POST /api/orders response body: the checkout payload.
#[derive(Debug, Serialize)]
pub struct CreateOrderResponse {
    pub order_id: String,
    pub amount: String,
    pub copy_paste_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code_base64: Option<String>,
}

/// POST /api/orders/{id}/confirm request body.
#[derive(Debug, Deserialize)]
pub struct ConfirmOrderRequest {
    /// Messaging-platform user id of the poller; must own the order.
    pub user_id: i64,
}

/// POST /api/orders/{id}/confirm response body.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConfirmOrderResponse {
    /// Gateway has not confirmed yet; try again shortly.
    NotYetConfirmed { gateway_status: String },

    /// Payment confirmed; access granted.
    AccessGranted {
        #[serde(skip_serializing_if = "Option::is_none")]
        invite_url: Option<String>,
    },

    /// Payment confirmed; the access artifact is still on its way.
    ConfirmedAwaitingGrant,

    /// The order closed without payment; open a new order to pay.
    Closed { order_status: String },

    /// Another confirmation already finalized this order.
    AlreadyFinalized {
        order_status: String,
        granted: bool,
    },
}

impl From<ReconcileOutcome> for ConfirmOrderResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        match outcome {
            ReconcileOutcome::NotYetConfirmed { status } => ConfirmOrderResponse::NotYetConfirmed {
                gateway_status: status.to_string(),
            },
            ReconcileOutcome::AccessGranted { grant } => ConfirmOrderResponse::AccessGranted {
                invite_url: match grant {
                    GrantOutcome::InviteDelivered { invite } => Some(invite.url),
                    GrantOutcome::EntryApproved | GrantOutcome::PreAuthorized => None,
                },
            },
            ReconcileOutcome::ConfirmedAwaitingGrant => {
                ConfirmOrderResponse::ConfirmedAwaitingGrant
            }
            ReconcileOutcome::Closed { status } => ConfirmOrderResponse::Closed {
                order_status: status.to_string(),
            },
            ReconcileOutcome::AlreadyFinalized { status, granted } => {
                ConfirmOrderResponse::AlreadyFinalized {
                    order_status: status.to_string(),
                    granted,
                }
            }
            // Discarded only arises on the webhook path, which never renders
            // this DTO.
            ReconcileOutcome::Discarded => ConfirmOrderResponse::Closed {
                order_status: "discarded".to_string(),
            },
        }
    }
}

/// POST /api/entry-requests request body.
#[derive(Debug, Deserialize)]
pub struct EntryRequestBody {
    /// Messaging-platform user id asking to enter the resource.
    pub user_id: i64,
}

/// POST /api/entry-requests response body.
#[derive(Debug, Serialize)]
pub struct EntryRequestResponse {
    /// `auto_approved` or `queued`.
    pub decision: &'static str,
}

/// GET /api/orders/{id} response body.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub order_id: String,
    pub user_id: i64,
    pub plan_id: String,
    pub amount: String,
    pub status: String,
    pub granted: bool,
    pub created_at: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id.to_string(),
            user_id: order.user_id.as_i64(),
            plan_id: order.plan_id.to_string(),
            amount: order.amount.to_string(),
            status: order.status.to_string(),
            granted: order.granted,
            created_at: order.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
