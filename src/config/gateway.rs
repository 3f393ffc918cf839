//! Payment gateway configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// PIX gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    /// Gateway access token. Production tokens start with `APP_USR-`, test
    /// tokens with `TEST-`.
    pub access_token: String,

    /// Base URL override for the gateway API (testing only).
    pub api_base_url: Option<String>,

    /// Public webhook URL registered with the gateway. When unset, the
    /// gateway is not asked to push notifications and only the poll path
    /// confirms payments.
    pub notification_url: Option<String>,

    /// Shared secret for webhook signature verification. When unset,
    /// webhook payloads are accepted unverified.
    pub webhook_secret: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl GatewayConfig {
    /// Whether the token belongs to the gateway's test environment.
    pub fn is_test_mode(&self) -> bool {
        self.access_token.starts_with("TEST-")
    }

    /// Validates gateway configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.access_token.is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY_ACCESS_TOKEN"));
        }
        if !self.access_token.starts_with("APP_USR-") && !self.access_token.starts_with("TEST-") {
            return Err(ValidationError::InvalidGatewayToken);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        if let Some(secret) = &self.webhook_secret {
            if secret.is_empty() {
                return Err(ValidationError::MissingRequired("GATEWAY_WEBHOOK_SECRET"));
            }
        }
        Ok(())
    }
}

fn default_request_timeout() -> u64 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> GatewayConfig {
        GatewayConfig {
            access_token: "APP_USR-1234".to_string(),
            request_timeout_secs: 25,
            ..Default::default()
        }
    }

    #[test]
    fn production_token_passes() {
        let config = valid();
        assert!(config.validate().is_ok());
        assert!(!config.is_test_mode());
    }

    #[test]
    fn test_token_is_flagged() {
        let config = GatewayConfig {
            access_token: "TEST-1234".to_string(),
            ..valid()
        };
        assert!(config.validate().is_ok());
        assert!(config.is_test_mode());
    }

    #[test]
    fn missing_token_is_rejected() {
        let config = GatewayConfig {
            access_token: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn unexpected_token_prefix_is_rejected() {
        let config = GatewayConfig {
            access_token: "sk_live_nope".to_string(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_webhook_secret_is_rejected() {
        let config = GatewayConfig {
            webhook_secret: Some(String::new()),
            ..valid()
        };
        assert!(config.validate().is_err());
    }
}
