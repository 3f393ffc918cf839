//! Telegram Bot API implementation of the resource authority.
//!
//! Deliberately thin: only the calls the access granter needs exist here:
//! single-use invite creation, join-request approval/decline, and invite
//! delivery. The conversational bot surface lives outside this service.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{AuthorityError, InviteLink, ResourceAuthority};

/// Telegram Bot API configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token issued by BotFather.
    bot_token: SecretString,

    /// Base URL for the Bot API.
    api_base_url: String,

    /// Chat id of the protected channel.
    chat_id: i64,

    /// Lifetime of issued invite links, in seconds.
    invite_ttl_secs: u64,

    /// Per-request timeout.
    request_timeout: Duration,
}

impl TelegramConfig {
    /// Creates a configuration against the production Bot API.
    pub fn new(bot_token: impl Into<String>, chat_id: i64) -> Self {
        Self {
            bot_token: SecretString::new(bot_token.into()),
            api_base_url: "https://api.telegram.org".to_string(),
            chat_id,
            invite_ttl_secs: 3600,
            request_timeout: Duration::from_secs(15),
        }
    }

    /// Overrides the API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Overrides the invite link lifetime.
    pub fn with_invite_ttl_secs(mut self, secs: u64) -> Self {
        self.invite_ttl_secs = secs;
        self
    }
}

/// Bot API response envelope.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatInviteLink {
    invite_link: String,
}

/// Resource authority backed by the Telegram Bot API.
pub struct TelegramAuthority {
    config: TelegramConfig,
    http_client: reqwest::Client,
}

impl TelegramAuthority {
    /// Creates a new authority adapter.
    pub fn new(config: TelegramConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<T, AuthorityError> {
        let url = format!(
            "{}/bot{}/{}",
            self.config.api_base_url,
            self.config.bot_token.expose_secret(),
            method
        );

        let response = self
            .http_client
            .post(&url)
            .timeout(self.config.request_timeout)
            .json(&body)
            .send()
            .await
            .map_err(AuthorityError::unreachable)?;

        if response.status().is_server_error() {
            return Err(AuthorityError::unreachable(format!(
                "bot API returned {}",
                response.status()
            )));
        }

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| AuthorityError::unreachable(format!("invalid bot API response: {}", e)))?;

        if !envelope.ok {
            return Err(AuthorityError::refused(
                envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            ));
        }

        envelope
            .result
            .ok_or_else(|| AuthorityError::unreachable("bot API response carries no result"))
    }
}

#[async_trait]
impl ResourceAuthority for TelegramAuthority {
    async fn create_single_use_invite(&self, user: UserId) -> Result<InviteLink, AuthorityError> {
        let expires_at = Timestamp::now().plus_secs(self.config.invite_ttl_secs);
        let link: ChatInviteLink = self
            .call(
                "createChatInviteLink",
                json!({
                    "chat_id": self.config.chat_id,
                    "name": format!("order access for {}", user),
                    "member_limit": 1,
                    "expire_date": expires_at.as_unix_secs(),
                }),
            )
            .await?;

        Ok(InviteLink {
            url: link.invite_link,
            expires_at,
        })
    }

    async fn approve_entry(&self, user: UserId) -> Result<(), AuthorityError> {
        let _: bool = self
            .call(
                "approveChatJoinRequest",
                json!({
                    "chat_id": self.config.chat_id,
                    "user_id": user.as_i64(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn decline_entry(&self, user: UserId) -> Result<(), AuthorityError> {
        let _: bool = self
            .call(
                "declineChatJoinRequest",
                json!({
                    "chat_id": self.config.chat_id,
                    "user_id": user.as_i64(),
                }),
            )
            .await?;
        Ok(())
    }

    async fn deliver_invite(
        &self,
        user: UserId,
        invite: &InviteLink,
    ) -> Result<(), AuthorityError> {
        let _: serde_json::Value = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": user.as_i64(),
                    "text": format!(
                        "Pagamento confirmado! Aqui esta seu acesso VIP:\n{}",
                        invite.url
                    ),
                    "disable_web_page_preview": true,
                }),
            )
            .await?;
        Ok(())
    }
}
