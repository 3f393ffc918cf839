//! Axum router configuration.
//!
//! # Routes
//!
//! ## Order API
//! - `POST /api/orders` - open an order and its payment intent
//! - `GET /api/orders/{id}` - current order state
//! - `POST /api/orders/{id}/confirm` - poll trigger ("I already paid")
//! - `POST /api/entry-requests` - entry request forwarded by the bot layer
//!
//! ## Webhooks (no auth; optional signature verification)
//! - `POST /webhooks/pix` - gateway payment notifications
//!
//! ## Operational
//! - `GET /health` - liveness probe

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    confirm_order, create_order, get_order, handle_entry_request, handle_gateway_webhook, health,
    AppState,
};

/// Order API router, mounted at `/api`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/confirm", post(confirm_order))
        .route("/entry-requests", post(handle_entry_request))
}

/// Webhook router, mounted at `/webhooks`.
///
/// Separate from the order API because webhook callers authenticate via
/// signature, not via user identity.
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/pix", post(handle_gateway_webhook))
}

/// The complete application router.
pub fn app_router() -> Router<AppState> {
    Router::new()
        .nest("/api", order_routes())
        .nest("/webhooks", webhook_routes())
        .route("/health", get(health))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::access::InviteLinkGranter;
    use crate::adapters::gateway::MockGateway;
    use crate::adapters::memory::{InMemoryEntryTracker, InMemoryOrderStore};
    use crate::config::PlansConfig;
    use crate::domain::foundation::{Timestamp, UserId};
    use crate::ports::{AuthorityError, InviteLink, ResourceAuthority};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct StubAuthority;

    #[async_trait]
    impl ResourceAuthority for StubAuthority {
        async fn create_single_use_invite(
            &self,
            _user: UserId,
        ) -> Result<InviteLink, AuthorityError> {
            Ok(InviteLink {
                url: "https://t.me/+abc".to_string(),
                expires_at: Timestamp::now().plus_secs(3600),
            })
        }

        async fn approve_entry(&self, _user: UserId) -> Result<(), AuthorityError> {
            Ok(())
        }

        async fn decline_entry(&self, _user: UserId) -> Result<(), AuthorityError> {
            Ok(())
        }

        async fn deliver_invite(
            &self,
            _user: UserId,
            _invite: &InviteLink,
        ) -> Result<(), AuthorityError> {
            Ok(())
        }
    }

    fn test_state() -> AppState {
        let tracker = Arc::new(InMemoryEntryTracker::new());
        let authority = Arc::new(StubAuthority);
        AppState {
            store: Arc::new(InMemoryOrderStore::new()),
            gateway: Arc::new(MockGateway::new()),
            granter: Arc::new(InviteLinkGranter::new(authority.clone())),
            tracker: tracker.clone(),
            preauthorized: tracker,
            authority,
            catalog: PlansConfig::default().catalog().unwrap(),
            webhook_secret: None,
        }
    }

    #[test]
    fn order_routes_build() {
        let _: Router<()> = order_routes().with_state(test_state());
    }

    #[test]
    fn webhook_routes_build() {
        let _: Router<()> = webhook_routes().with_state(test_state());
    }

    #[test]
    fn app_router_builds() {
        let _: Router<()> = app_router().with_state(test_state());
    }
}
