//! Webhook signature verification.
//!
//! The gateway signs webhook deliveries with HMAC-SHA256 over
//! `{timestamp}.{payload}` and sends the result in an `x-signature` header of
//! the form `ts=<unix>,v1=<hex>`. Verification uses constant-time comparison
//! and bounds the timestamp to a short window so captured deliveries cannot
//! be replayed later.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age for webhook deliveries (5 minutes).
const MAX_TIMESTAMP_AGE_SECS: i64 = 300;

/// Clock skew tolerance for future timestamps (60 seconds).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 60;

/// Signature verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing or empty signature header")]
    MissingHeader,

    #[error("malformed signature header")]
    MalformedHeader,

    #[error("signature timestamp outside the accepted window")]
    TimestampOutOfWindow,

    #[error("signature mismatch")]
    Mismatch,
}

/// Parsed `x-signature` header components.
#[derive(Debug, Clone)]
pub struct SignatureHeader {
    /// Unix timestamp the gateway generated the signature at.
    pub timestamp: i64,

    /// HMAC-SHA256 digest bytes.
    pub v1_signature: Vec<u8>,
}

impl SignatureHeader {
    /// Parses a `ts=<unix>,v1=<hex>` header.
    pub fn parse(header: &str) -> Result<Self, SignatureError> {
        if header.is_empty() {
            return Err(SignatureError::MissingHeader);
        }

        let mut timestamp: Option<i64> = None;
        let mut v1_signature: Option<Vec<u8>> = None;

        for part in header.split(',') {
            let (key, value) = part
                .split_once('=')
                .ok_or(SignatureError::MalformedHeader)?;
            match key.trim() {
                "ts" => {
                    timestamp =
                        Some(value.trim().parse().map_err(|_| SignatureError::MalformedHeader)?);
                }
                "v1" => {
                    v1_signature = Some(hex_decode(value.trim())?);
                }
                _ => {}
            }
        }

        Ok(Self {
            timestamp: timestamp.ok_or(SignatureError::MalformedHeader)?,
            v1_signature: v1_signature.ok_or(SignatureError::MalformedHeader)?,
        })
    }
}

/// Verifies a webhook delivery against the configured secret.
pub fn verify_webhook_signature(
    secret: &str,
    payload: &[u8],
    header: &str,
) -> Result<(), SignatureError> {
    let header = SignatureHeader::parse(header)?;

    let now = chrono::Utc::now().timestamp();
    let age = now - header.timestamp;
    if age > MAX_TIMESTAMP_AGE_SECS || age < -MAX_FUTURE_TOLERANCE_SECS {
        return Err(SignatureError::TimestampOutOfWindow);
    }

    let expected = sign(secret, header.timestamp, payload);
    if expected.ct_eq(header.v1_signature.as_slice()).unwrap_u8() != 1 {
        tracing::warn!(
            provided_signature = %hex_encode(&header.v1_signature),
            "webhook signature mismatch"
        );
        return Err(SignatureError::Mismatch);
    }

    Ok(())
}

/// Computes the HMAC-SHA256 digest over `{timestamp}.{payload}`.
fn sign(secret: &str, timestamp: i64, payload: &[u8]) -> Vec<u8> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac.finalize().into_bytes().to_vec()
}

/// Encodes bytes as lowercase hex.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(s: &str) -> Result<Vec<u8>, SignatureError> {
    if s.len() % 2 != 0 || s.is_empty() {
        return Err(SignatureError::MalformedHeader);
    }
    (0..s.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| SignatureError::MalformedHeader)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_header(secret: &str, timestamp: i64, payload: &[u8]) -> String {
        format!("ts={},v1={}", timestamp, hex_encode(&sign(secret, timestamp, payload)))
    }

    #[test]
    fn accepts_a_valid_signature() {
        let payload = br#"{"data":{"id":"P1"}}"#;
        let now = chrono::Utc::now().timestamp();
        let header = signed_header("whsec", now, payload);
        assert!(verify_webhook_signature("whsec", payload, &header).is_ok());
    }

    #[test]
    fn rejects_a_tampered_payload() {
        let now = chrono::Utc::now().timestamp();
        let header = signed_header("whsec", now, br#"{"data":{"id":"P1"}}"#);
        assert_eq!(
            verify_webhook_signature("whsec", br#"{"data":{"id":"P2"}}"#, &header),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_a_wrong_secret() {
        let payload = b"{}";
        let now = chrono::Utc::now().timestamp();
        let header = signed_header("whsec", now, payload);
        assert_eq!(
            verify_webhook_signature("other", payload, &header),
            Err(SignatureError::Mismatch)
        );
    }

    #[test]
    fn rejects_stale_timestamps() {
        let payload = b"{}";
        let stale = chrono::Utc::now().timestamp() - 3600;
        let header = signed_header("whsec", stale, payload);
        assert_eq!(
            verify_webhook_signature("whsec", payload, &header),
            Err(SignatureError::TimestampOutOfWindow)
        );
    }

    #[test]
    fn rejects_malformed_headers() {
        assert_eq!(
            SignatureHeader::parse("").unwrap_err(),
            SignatureError::MissingHeader
        );
        assert_eq!(
            SignatureHeader::parse("ts=notanumber,v1=ab").unwrap_err(),
            SignatureError::MalformedHeader
        );
        assert_eq!(
            SignatureHeader::parse("v1=abcd").unwrap_err(),
            SignatureError::MalformedHeader
        );
        assert_eq!(
            SignatureHeader::parse("ts=123").unwrap_err(),
            SignatureError::MalformedHeader
        );
        assert_eq!(
            SignatureHeader::parse("ts=123,v1=xyz").unwrap_err(),
            SignatureError::MalformedHeader
        );
    }

    #[test]
    fn hex_roundtrip() {
        let bytes = vec![0x00, 0x0f, 0xab, 0xff];
        assert_eq!(hex_decode(&hex_encode(&bytes)).unwrap(), bytes);
    }
}
