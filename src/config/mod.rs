//! Application configuration module.
//!
//! Type-safe configuration loading from environment variables via the
//! `config` and `dotenvy` crates. Values use the `VIP_GATE` prefix with `__`
//! separating nested sections.
//!
//! # Example
//!
//! ```no_run
//! use vip_gate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod access;
mod database;
mod error;
mod gateway;
mod plans;
mod server;
mod telegram;

pub use access::{AccessConfig, GrantMode};
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use plans::PlansConfig;
pub use server::{Environment, ServerConfig};
pub use telegram::TelegramConfig;

use serde::Deserialize;

/// Root application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment).
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (PostgreSQL connection).
    pub database: DatabaseConfig,

    /// Payment gateway configuration (PIX).
    pub gateway: GatewayConfig,

    /// Messaging platform configuration (Bot API).
    pub telegram: TelegramConfig,

    /// Access granting configuration.
    #[serde(default)]
    pub access: AccessConfig,

    /// Plan catalog configuration.
    #[serde(default)]
    pub plans: PlansConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// Reads a `.env` file first when present (development), then
    /// environment variables shaped like `VIP_GATE__SERVER__PORT=8080` and
    /// `VIP_GATE__DATABASE__URL=...`.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("VIP_GATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validates every configuration section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.gateway.validate()?;
        self.telegram.validate()?;
        self.access.validate()?;
        self.plans.validate()?;
        Ok(())
    }

    /// Whether this deployment runs in production.
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}
