//! HTTP handlers connecting Axum routes to the application layer.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use crate::application::{
    CreateOrderCommand, CreateOrderError, CreateOrderHandler, EntryDecision, EntryRequestError,
    EntryRequestHandler, ReconcileError, ReconcileOrderHandler, ReconcileTrigger,
};
use crate::domain::foundation::{GatewayPaymentId, OrderId, PlanId, UserId};
use crate::domain::plan::PlanCatalog;
use crate::ports::{
    AccessGranter, AuthorityError, EntryRequestTracker, GatewayError, OrderStore, PaymentGateway,
    PreauthorizedEntries, ResourceAuthority,
};

use super::super::gateway::{extract_webhook_payment_id, verify_webhook_signature};
use super::dto::{
    ConfirmOrderRequest, ConfirmOrderResponse, CreateOrderRequest, CreateOrderResponse,
    EntryRequestBody, EntryRequestResponse, ErrorResponse, OrderView,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state; cloned per request, dependencies Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn OrderStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub granter: Arc<dyn AccessGranter>,
    pub tracker: Arc<dyn EntryRequestTracker>,
    pub preauthorized: Arc<dyn PreauthorizedEntries>,
    pub authority: Arc<dyn ResourceAuthority>,
    pub catalog: PlanCatalog,

    /// Webhook signature secret; `None` accepts unsigned deliveries.
    pub webhook_secret: Option<String>,
}

impl AppState {
    fn create_order_handler(&self) -> CreateOrderHandler {
        CreateOrderHandler::new(self.store.clone(), self.gateway.clone(), self.catalog.clone())
    }

    fn reconcile_handler(&self) -> ReconcileOrderHandler {
        ReconcileOrderHandler::new(
            self.store.clone(),
            self.gateway.clone(),
            self.granter.clone(),
        )
    }

    fn entry_request_handler(&self) -> EntryRequestHandler {
        EntryRequestHandler::new(
            self.tracker.clone(),
            self.preauthorized.clone(),
            self.authority.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Order API
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/orders - open an order and its payment intent.
pub async fn create_order(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(request.user_id)
        .map_err(|e| ApiError::validation("user_id", e.to_string()))?;
    let plan_id = PlanId::new(&request.plan_id)
        .map_err(|e| ApiError::validation("plan_id", e.to_string()))?;

    let handler = state.create_order_handler();
    let result = handler
        .handle(CreateOrderCommand {
            user_id,
            plan_id,
            payer_email: request.payer_email,
        })
        .await?;

    let response = CreateOrderResponse {
        order_id: result.order_id.to_string(),
        amount: result.amount.to_string(),
        copy_paste_code: result.checkout.copy_paste_code,
        qr_code_base64: result.checkout.qr_code_base64,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/orders/{id} - current order state.
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id =
        OrderId::from_str(&id).map_err(|e| ApiError::validation("order_id", e.to_string()))?;

    let order = state
        .store
        .get(order_id)
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or(ApiError::OrderNotFound)?;

    Ok(Json(OrderView::from(order)))
}

/// POST /api/orders/{id}/confirm - the poll trigger ("I already paid").
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ConfirmOrderRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let order_id =
        OrderId::from_str(&id).map_err(|e| ApiError::validation("order_id", e.to_string()))?;
    let requested_by = UserId::new(request.user_id)
        .map_err(|e| ApiError::validation("user_id", e.to_string()))?;

    let handler = state.reconcile_handler();
    let outcome = handler
        .handle(ReconcileTrigger::Poll {
            order_id,
            requested_by,
        })
        .await?;

    Ok(Json(ConfirmOrderResponse::from(outcome)))
}

/// POST /api/entry-requests - an entry (join) request forwarded by the bot
/// layer.
pub async fn handle_entry_request(
    State(state): State<AppState>,
    Json(request): Json<EntryRequestBody>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = UserId::new(request.user_id)
        .map_err(|e| ApiError::validation("user_id", e.to_string()))?;

    let handler = state.entry_request_handler();
    let decision = handler.handle(user_id).await?;

    let response = EntryRequestResponse {
        decision: match decision {
            EntryDecision::AutoApproved => "auto_approved",
            EntryDecision::Queued => "queued",
        },
    };
    Ok(Json(response))
}

/// GET /health - liveness probe.
pub async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

// ════════════════════════════════════════════════════════════════════════════════
// Gateway webhook
// ════════════════════════════════════════════════════════════════════════════════

/// POST /webhooks/pix - inbound gateway notification.
///
/// Always acknowledges with 200 regardless of internal processing outcome, so
/// the gateway never enters a retry storm; internal conditions are logged.
pub async fn handle_gateway_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    if let Some(secret) = &state.webhook_secret {
        let header = headers
            .get("x-signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if let Err(err) = verify_webhook_signature(secret, &body, header) {
            tracing::warn!(error = %err, "webhook signature verification failed");
            return ack();
        }
    }

    let payload: serde_json::Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "webhook body is not JSON");
            return ack();
        }
    };

    let Some(raw_id) = extract_webhook_payment_id(&payload) else {
        tracing::info!("webhook without payment id acknowledged");
        return ack();
    };
    let Ok(gateway_payment_id) = GatewayPaymentId::new(raw_id) else {
        return ack();
    };

    match state
        .reconcile_handler()
        .handle(ReconcileTrigger::Webhook { gateway_payment_id })
        .await
    {
        Ok(outcome) => {
            tracing::debug!(outcome = ?outcome, "webhook reconciliation finished");
        }
        Err(err) => {
            // Swallowed at the boundary; the condition stays visible to
            // operators through the log.
            tracing::warn!(error = %err, "webhook reconciliation failed");
        }
    }

    ack()
}

fn ack() -> axum::response::Response {
    Json(json!({"ok": true})).into_response()
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type mapping application errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Validation { field: &'static str, message: String },
    UnknownPlan(String),
    OrderNotFound,
    NotOrderOwner,
    OrderNotReady,
    GatewayRejected(String),
    GatewayUnavailable(String),
    AuthorityUnavailable(String),
    Internal(String),
}

impl ApiError {
    fn validation(field: &'static str, message: impl Into<String>) -> Self {
        ApiError::Validation {
            field,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

impl From<CreateOrderError> for ApiError {
    fn from(err: CreateOrderError) -> Self {
        match err {
            CreateOrderError::UnknownPlan(plan) => ApiError::UnknownPlan(plan.to_string()),
            CreateOrderError::Gateway(GatewayError::Unavailable { detail }) => {
                ApiError::GatewayUnavailable(detail)
            }
            CreateOrderError::Gateway(gateway) => ApiError::GatewayRejected(gateway.to_string()),
            CreateOrderError::Store(store) => ApiError::Internal(store.to_string()),
        }
    }
}

impl From<EntryRequestError> for ApiError {
    fn from(err: EntryRequestError) -> Self {
        match err {
            EntryRequestError::Tracker(tracker) => ApiError::Internal(tracker.to_string()),
            EntryRequestError::Authority(AuthorityError::Unreachable(detail)) => {
                ApiError::AuthorityUnavailable(detail)
            }
            EntryRequestError::Authority(authority) => ApiError::Internal(authority.to_string()),
        }
    }
}

impl From<ReconcileError> for ApiError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::OrderNotFound(_) => ApiError::OrderNotFound,
            ReconcileError::NotOrderOwner(_) => ApiError::NotOrderOwner,
            ReconcileError::OrderNotReady(_) => ApiError::OrderNotReady,
            ReconcileError::Gateway(GatewayError::Unavailable { detail }) => {
                ApiError::GatewayUnavailable(detail)
            }
            ReconcileError::Gateway(gateway) => ApiError::GatewayRejected(gateway.to_string()),
            ReconcileError::Store(store) => ApiError::Internal(store.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_FAILED",
                format!("{}: {}", field, message),
            ),
            ApiError::UnknownPlan(plan) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_PLAN",
                format!("No such plan: {}", plan),
            ),
            ApiError::OrderNotFound => (
                StatusCode::NOT_FOUND,
                "ORDER_NOT_FOUND",
                "Order not found; open a new one".to_string(),
            ),
            ApiError::NotOrderOwner => (
                StatusCode::FORBIDDEN,
                "NOT_ORDER_OWNER",
                "This order belongs to another user".to_string(),
            ),
            ApiError::OrderNotReady => (
                StatusCode::CONFLICT,
                "ORDER_NOT_READY",
                "Payment intent not created yet".to_string(),
            ),
            ApiError::GatewayRejected(detail) => (
                StatusCode::BAD_GATEWAY,
                "GATEWAY_REJECTED",
                format!("Payment setup failed, open a new order: {}", detail),
            ),
            ApiError::GatewayUnavailable(detail) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "GATEWAY_UNAVAILABLE",
                format!("Gateway unreachable, try again shortly: {}", detail),
            ),
            ApiError::AuthorityUnavailable(detail) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "AUTHORITY_UNAVAILABLE",
                format!("Messaging platform unreachable, try again shortly: {}", detail),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail = %detail, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "Internal error".to_string(),
                )
            }
        };

        let body = ErrorResponse::new(code, message);
        (status, Json(body)).into_response()
    }
}
