//! HTTP surface: order API, gateway webhook, health.

mod dto;
mod handlers;
mod routes;

pub use handlers::AppState;
pub use routes::app_router;
