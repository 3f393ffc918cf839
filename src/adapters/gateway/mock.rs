//! Mock payment gateway for tests and development.
//!
//! Supports scriptable statuses per payment, error injection, and real
//! idempotency-token semantics: a repeated token returns the intent created
//! the first time instead of opening a second billable one.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::foundation::GatewayPaymentId;
use crate::ports::{
    CheckoutPresentation, CreatePaymentIntent, GatewayError, NormalizedStatus, PaymentGateway,
    PaymentIntent,
};

#[derive(Default)]
struct MockState {
    /// Scripted status per payment id.
    statuses: HashMap<String, NormalizedStatus>,

    /// Intents already created, keyed by idempotency token.
    intents_by_token: HashMap<String, PaymentIntent>,

    /// Monotonic counter for generated payment ids.
    next_payment_seq: u64,

    /// Error injected into creation calls.
    fail_create: Option<GatewayError>,

    /// Error injected into status queries.
    fail_status: Option<GatewayError>,
}

/// Scriptable in-memory gateway.
#[derive(Default)]
pub struct MockGateway {
    inner: Mutex<MockState>,
}

impl MockGateway {
    /// Creates a mock where new payments start `pending`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the status reported for a payment id.
    pub fn set_status(&self, payment_id: &str, status: NormalizedStatus) {
        self.inner
            .lock()
            .unwrap()
            .statuses
            .insert(payment_id.to_string(), status);
    }

    /// Injects an error into subsequent creation calls.
    pub fn fail_creations_with(&self, err: GatewayError) {
        self.inner.lock().unwrap().fail_create = Some(err);
    }

    /// Injects an error into subsequent status queries.
    pub fn fail_status_with(&self, err: GatewayError) {
        self.inner.lock().unwrap().fail_status = Some(err);
    }

    /// Number of distinct billable intents opened so far.
    pub fn billable_intents(&self) -> usize {
        self.inner.lock().unwrap().intents_by_token.len()
    }

    /// Creation entry point carrying an explicit idempotency token.
    ///
    /// The trait implementation calls this with a fresh token per logical
    /// creation, matching the real adapter; tests call it directly to prove
    /// that a duplicated token cannot open a second intent.
    pub fn create_with_token(
        &self,
        token: &str,
        request: &CreatePaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        let mut state = self.inner.lock().unwrap();

        if let Some(err) = &state.fail_create {
            return Err(err.clone());
        }

        if let Some(existing) = state.intents_by_token.get(token) {
            // Same token, same intent: the retry is absorbed.
            return Ok(existing.clone());
        }

        state.next_payment_seq += 1;
        let payment_id = format!("P{}", state.next_payment_seq);
        let intent = PaymentIntent {
            gateway_payment_id: GatewayPaymentId::new(payment_id.clone())
                .expect("generated id is non-empty"),
            status: NormalizedStatus::Pending,
            checkout: CheckoutPresentation {
                copy_paste_code: format!("00020126-mock-pix-{}", request.order_id),
                qr_code_base64: None,
            },
        };

        state.statuses.insert(payment_id, NormalizedStatus::Pending);
        state
            .intents_by_token
            .insert(token.to_string(), intent.clone());
        Ok(intent)
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        let token = Uuid::new_v4().to_string();
        self.create_with_token(&token, &request)
    }

    async fn get_payment_status(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<NormalizedStatus, GatewayError> {
        let state = self.inner.lock().unwrap();
        if let Some(err) = &state.fail_status {
            return Err(err.clone());
        }
        Ok(state
            .statuses
            .get(id.as_str())
            .copied()
            .unwrap_or(NormalizedStatus::Unknown))
    }
}
