//! Messaging-platform adapter for the resource authority port.

mod bot_api;

pub use bot_api::{TelegramAuthority, TelegramConfig};
