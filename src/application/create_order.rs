//! Order creation handler.
//!
//! Resolves the plan, persists the order, opens the payment intent at the
//! gateway, and hands the checkout payload (PIX copy-paste code, QR image)
//! back to the caller. A terminal gateway failure closes the attempt as
//! `error`; the user starts over with a new order.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::foundation::{Amount, OrderId, PlanId, UserId};
use crate::domain::order::{Order, OrderStatus};
use crate::domain::plan::PlanCatalog;
use crate::ports::{
    CheckoutPresentation, CreatePaymentIntent, GatewayError, OrderStore, PaymentGateway, StoreError,
};

/// Command to open a new purchase order.
#[derive(Debug, Clone)]
pub struct CreateOrderCommand {
    pub user_id: UserId,
    pub plan_id: PlanId,
    pub payer_email: Option<String>,
}

/// A freshly opened order, ready to present to the payer.
#[derive(Debug, Clone)]
pub struct CreateOrderResult {
    pub order_id: OrderId,
    pub amount: Amount,
    pub checkout: CheckoutPresentation,
}

/// Errors from order creation.
#[derive(Debug, Error)]
pub enum CreateOrderError {
    /// The plan id is not in the catalog.
    #[error("unknown plan: {0}")]
    UnknownPlan(PlanId),

    /// The gateway failed; the order was closed as `error` and the user must
    /// open a new one. `GatewayError::Unavailable` is worth retrying soon.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Handler for opening orders and their payment intents.
pub struct CreateOrderHandler {
    store: Arc<dyn OrderStore>,
    gateway: Arc<dyn PaymentGateway>,
    catalog: PlanCatalog,
}

impl CreateOrderHandler {
    pub fn new(
        store: Arc<dyn OrderStore>,
        gateway: Arc<dyn PaymentGateway>,
        catalog: PlanCatalog,
    ) -> Self {
        Self {
            store,
            gateway,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateOrderCommand,
    ) -> Result<CreateOrderResult, CreateOrderError> {
        let plan = self
            .catalog
            .find(&cmd.plan_id)
            .ok_or_else(|| CreateOrderError::UnknownPlan(cmd.plan_id.clone()))?;

        let order = Order::new(
            cmd.user_id,
            plan.id.clone(),
            plan.price,
            cmd.payer_email.clone(),
        );
        self.store.create(&order).await?;
        tracing::info!(order_id = %order.id, user_id = %order.user_id, plan = %plan.id, "order created");

        let request = CreatePaymentIntent {
            amount: order.amount,
            description: format!("{} - order {}", plan.name, order.id),
            order_id: order.id,
            payer_email: cmd.payer_email,
        };

        let intent = match self.gateway.create_payment_intent(request).await {
            Ok(intent) => intent,
            Err(err) => {
                // The attempt is dead either way; close it so it can never be
                // confused with a payable order.
                let closed = self
                    .store
                    .compare_and_set_status(order.id, OrderStatus::Created, OrderStatus::Error)
                    .await?;
                tracing::warn!(
                    order_id = %order.id,
                    error = %err,
                    closed,
                    "payment intent creation failed"
                );
                return Err(err.into());
            }
        };

        let advanced = self
            .store
            .record_payment_intent(order.id, &intent.gateway_payment_id)
            .await?;
        if !advanced {
            // Only possible if something else touched a just-created order.
            tracing::warn!(order_id = %order.id, "order left created state during intent creation");
        }

        Ok(CreateOrderResult {
            order_id: order.id,
            amount: order.amount,
            checkout: intent.checkout,
        })
    }
}
