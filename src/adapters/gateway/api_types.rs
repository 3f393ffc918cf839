//! Wire types for the PIX gateway REST API.
//!
//! These structs mirror the gateway's JSON accurately and stay private to the
//! adapter; everything crossing into the application is converted to port
//! types first.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ports::NormalizedStatus;

/// Body of `POST /v1/payments`.
#[derive(Debug, Serialize)]
pub(super) struct CreatePaymentBody {
    pub transaction_amount: Decimal,
    pub description: String,
    pub payment_method_id: &'static str,
    /// Our order id; lets gateway-side records correlate back to us even when
    /// a notification carries only the gateway's own identifier.
    pub external_reference: String,
    pub payer: PayerBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct PayerBody {
    pub email: String,
}

/// Response of payment creation and of `GET /v1/payments/{id}`.
#[derive(Debug, Deserialize)]
pub(super) struct PaymentResponse {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub point_of_interaction: Option<PointOfInteraction>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PointOfInteraction {
    pub transaction_data: Option<TransactionData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct TransactionData {
    pub qr_code: Option<String>,
    pub qr_code_base64: Option<String>,
}

/// Maps a raw gateway status string into the engine's vocabulary.
pub(super) fn normalize_status(raw: &str) -> NormalizedStatus {
    match raw {
        "pending" => NormalizedStatus::Pending,
        "in_process" | "in_mediation" | "authorized" => NormalizedStatus::Processing,
        "approved" => NormalizedStatus::Approved,
        "rejected" => NormalizedStatus::Rejected,
        "cancelled" | "expired" => NormalizedStatus::Expired,
        _ => NormalizedStatus::Unknown,
    }
}

/// Extracts the payment id from a webhook body.
///
/// Notification types nest the identifier differently: payment events carry
/// `{"data": {"id": ...}}` while older topics put `id` at the top level, and
/// the value arrives as a number or a string depending on the topic. All
/// shapes are tolerated.
pub fn extract_webhook_payment_id(body: &serde_json::Value) -> Option<String> {
    let candidate = body
        .get("data")
        .and_then(|data| data.get("id"))
        .or_else(|| body.get("id"))?;

    match candidate {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_documented_statuses() {
        assert_eq!(normalize_status("pending"), NormalizedStatus::Pending);
        assert_eq!(normalize_status("in_process"), NormalizedStatus::Processing);
        assert_eq!(normalize_status("approved"), NormalizedStatus::Approved);
        assert_eq!(normalize_status("rejected"), NormalizedStatus::Rejected);
        assert_eq!(normalize_status("cancelled"), NormalizedStatus::Expired);
        assert_eq!(normalize_status("expired"), NormalizedStatus::Expired);
    }

    #[test]
    fn unrecognized_statuses_normalize_to_unknown() {
        assert_eq!(normalize_status("charged_back"), NormalizedStatus::Unknown);
        assert_eq!(normalize_status(""), NormalizedStatus::Unknown);
    }

    #[test]
    fn extracts_nested_string_id() {
        let body = json!({"type": "payment", "data": {"id": "P1"}});
        assert_eq!(extract_webhook_payment_id(&body), Some("P1".to_string()));
    }

    #[test]
    fn extracts_nested_numeric_id() {
        let body = json!({"data": {"id": 12345678901i64}});
        assert_eq!(
            extract_webhook_payment_id(&body),
            Some("12345678901".to_string())
        );
    }

    #[test]
    fn extracts_top_level_id() {
        let body = json!({"id": 555, "topic": "payment"});
        assert_eq!(extract_webhook_payment_id(&body), Some("555".to_string()));
    }

    #[test]
    fn missing_id_yields_none() {
        assert_eq!(extract_webhook_payment_id(&json!({"topic": "merchant_order"})), None);
        assert_eq!(extract_webhook_payment_id(&json!({"data": {}})), None);
        assert_eq!(extract_webhook_payment_id(&json!({"data": {"id": ""}})), None);
    }

    #[test]
    fn payment_response_parses_gateway_json() {
        let json = r#"{
            "id": 123456789,
            "status": "pending",
            "point_of_interaction": {
                "transaction_data": {
                    "qr_code": "00020126580014br.gov.bcb.pix",
                    "qr_code_base64": "aGVsbG8="
                }
            }
        }"#;
        let parsed: PaymentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.id, Some(123456789));
        assert_eq!(parsed.status.as_deref(), Some("pending"));
        let tx = parsed
            .point_of_interaction
            .unwrap()
            .transaction_data
            .unwrap();
        assert_eq!(tx.qr_code.as_deref(), Some("00020126580014br.gov.bcb.pix"));
    }
}
