//! PIX gateway adapter.
//!
//! Implements the `PaymentGateway` port against a Mercado-Pago-shaped REST
//! API. Every creation request carries a fresh `X-Idempotency-Key`, so a
//! transport retry of the same logical creation can never open a second
//! billable intent on the gateway side.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use uuid::Uuid;

use crate::domain::foundation::GatewayPaymentId;
use crate::ports::{
    CheckoutPresentation, CreatePaymentIntent, GatewayError, NormalizedStatus, PaymentGateway,
    PaymentIntent,
};

use super::api_types::{normalize_status, CreatePaymentBody, PayerBody, PaymentResponse};

/// Email used when the payer never supplied one; the gateway requires the
/// field but does not verify it for PIX.
const FALLBACK_PAYER_DOMAIN: &str = "example.com";

/// PIX gateway configuration.
#[derive(Clone)]
pub struct PixConfig {
    /// Gateway access token.
    access_token: SecretString,

    /// Base URL for the gateway API.
    api_base_url: String,

    /// Public webhook URL registered with the gateway, when deployed behind
    /// a reachable host.
    notification_url: Option<String>,

    /// Per-request timeout.
    request_timeout: Duration,
}

impl PixConfig {
    /// Creates a configuration with the production API base URL.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: SecretString::new(access_token.into()),
            api_base_url: "https://api.mercadopago.com".to_string(),
            notification_url: None,
            request_timeout: Duration::from_secs(25),
        }
    }

    /// Overrides the API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Registers the public webhook URL sent with each creation.
    pub fn with_notification_url(mut self, url: impl Into<String>) -> Self {
        self.notification_url = Some(url.into());
        self
    }

    /// Overrides the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// PIX gateway adapter over reqwest.
pub struct PixPaymentAdapter {
    config: PixConfig,
    http_client: reqwest::Client,
}

impl PixPaymentAdapter {
    /// Creates a new adapter with the given configuration.
    pub fn new(config: PixConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    fn payer_email(request: &CreatePaymentIntent) -> String {
        request.payer_email.clone().unwrap_or_else(|| {
            format!("user{}@{}", request.order_id.as_uuid().simple(), FALLBACK_PAYER_DOMAIN)
        })
    }
}

#[async_trait]
impl PaymentGateway for PixPaymentAdapter {
    async fn create_payment_intent(
        &self,
        request: CreatePaymentIntent,
    ) -> Result<PaymentIntent, GatewayError> {
        let url = format!("{}/v1/payments", self.config.api_base_url);
        let idempotency_key = Uuid::new_v4().to_string();

        let body = CreatePaymentBody {
            transaction_amount: request.amount.as_decimal(),
            description: request.description.clone(),
            payment_method_id: "pix",
            external_reference: request.order_id.to_string(),
            payer: PayerBody {
                email: Self::payer_email(&request),
            },
            notification_url: self.config.notification_url.clone(),
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .header("X-Idempotency-Key", &idempotency_key)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::unavailable(format!("gateway returned {}", status)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, detail = %detail, "payment creation rejected");
            return Err(GatewayError::rejected(status.as_u16(), detail));
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::malformed(format!("invalid JSON: {}", e)))?;

        let id = payment
            .id
            .ok_or_else(|| GatewayError::malformed("response carries no payment id"))?;
        let gateway_payment_id = GatewayPaymentId::new(id.to_string())
            .map_err(|e| GatewayError::malformed(e.to_string()))?;

        let transaction = payment
            .point_of_interaction
            .and_then(|poi| poi.transaction_data);
        let copy_paste_code = transaction
            .as_ref()
            .and_then(|tx| tx.qr_code.clone())
            .ok_or_else(|| GatewayError::malformed("response carries no redeemable payment code"))?;
        let qr_code_base64 = transaction.and_then(|tx| tx.qr_code_base64);

        let normalized = payment
            .status
            .as_deref()
            .map(normalize_status)
            .unwrap_or(NormalizedStatus::Pending);

        tracing::info!(
            order_id = %request.order_id,
            gateway_payment_id = %gateway_payment_id,
            idempotency_key = %idempotency_key,
            "payment intent created"
        );

        Ok(PaymentIntent {
            gateway_payment_id,
            status: normalized,
            checkout: CheckoutPresentation {
                copy_paste_code,
                qr_code_base64,
            },
        })
    }

    async fn get_payment_status(
        &self,
        id: &GatewayPaymentId,
    ) -> Result<NormalizedStatus, GatewayError> {
        let url = format!("{}/v1/payments/{}", self.config.api_base_url, id);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.config.access_token.expose_secret())
            .timeout(self.config.request_timeout)
            .send()
            .await
            .map_err(|e| GatewayError::unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(GatewayError::unavailable(format!("gateway returned {}", status)));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::rejected(status.as_u16(), detail));
        }

        let payment: PaymentResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::malformed(format!("invalid JSON: {}", e)))?;

        Ok(payment
            .status
            .as_deref()
            .map(normalize_status)
            .unwrap_or(NormalizedStatus::Unknown))
    }
}
