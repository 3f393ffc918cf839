//! Messaging platform configuration.

use serde::Deserialize;

use super::error::ValidationError;

/// Telegram Bot API configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather (`<bot_id>:<secret>`).
    pub bot_token: String,

    /// Chat id of the protected channel. Channels and supergroups use
    /// negative ids.
    pub chat_id: i64,

    /// Base URL override for the Bot API (testing only).
    pub api_base_url: Option<String>,

    /// Lifetime of issued invite links, in seconds.
    #[serde(default = "default_invite_ttl")]
    pub invite_ttl_secs: u64,
}

impl TelegramConfig {
    /// Validates messaging platform configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.bot_token.is_empty() {
            return Err(ValidationError::MissingRequired("TELEGRAM_BOT_TOKEN"));
        }
        if self.chat_id == 0 {
            return Err(ValidationError::InvalidChatId);
        }
        if self.invite_ttl_secs == 0 {
            return Err(ValidationError::InvalidInviteTtl);
        }
        Ok(())
    }
}

fn default_invite_ttl() -> u64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123456:ABC-DEF".to_string(),
            chat_id: -1001234567890,
            api_base_url: None,
            invite_ttl_secs: 3600,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn missing_token_is_rejected() {
        let config = TelegramConfig {
            bot_token: String::new(),
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_chat_id_is_rejected() {
        let config = TelegramConfig {
            chat_id: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_invite_ttl_is_rejected() {
        let config = TelegramConfig {
            invite_ttl_secs: 0,
            ..valid()
        };
        assert!(config.validate().is_err());
    }
}
