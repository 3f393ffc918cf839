//! Service binary: configuration, adapter wiring, HTTP server.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use vip_gate::adapters::access::{EntryApprovalGranter, InviteLinkGranter};
use vip_gate::adapters::gateway::{PixConfig, PixPaymentAdapter};
use vip_gate::adapters::http::{app_router, AppState};
use vip_gate::adapters::postgres::{PgEntryTracker, PgOrderStore};
use vip_gate::adapters::telegram::{TelegramAuthority, TelegramConfig};
use vip_gate::application::RedriveGrantsHandler;
use vip_gate::config::{AppConfig, GrantMode};
use vip_gate::ports::AccessGranter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone())),
        )
        .init();

    config.validate()?;
    if config.gateway.is_test_mode() {
        tracing::warn!("gateway access token is a TEST token");
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let store = Arc::new(PgOrderStore::new(pool.clone()));
    let tracker = Arc::new(PgEntryTracker::new(pool.clone()));

    let mut pix_config = PixConfig::new(config.gateway.access_token.clone())
        .with_request_timeout(Duration::from_secs(config.gateway.request_timeout_secs));
    if let Some(url) = &config.gateway.api_base_url {
        pix_config = pix_config.with_base_url(url.clone());
    }
    if let Some(url) = &config.gateway.notification_url {
        pix_config = pix_config.with_notification_url(url.clone());
    }
    let gateway = Arc::new(PixPaymentAdapter::new(pix_config));

    let mut telegram_config =
        TelegramConfig::new(config.telegram.bot_token.clone(), config.telegram.chat_id)
            .with_invite_ttl_secs(config.telegram.invite_ttl_secs);
    if let Some(url) = &config.telegram.api_base_url {
        telegram_config = telegram_config.with_base_url(url.clone());
    }
    let authority = Arc::new(TelegramAuthority::new(telegram_config));

    let granter: Arc<dyn AccessGranter> = match config.access.grant_mode {
        GrantMode::InviteLink => Arc::new(InviteLinkGranter::new(authority.clone())),
        GrantMode::EntryApproval => Arc::new(EntryApprovalGranter::new(
            tracker.clone(),
            tracker.clone(),
            authority.clone(),
        )),
    };

    if let Some(interval_secs) = config.access.redrive_interval_secs {
        let redrive = RedriveGrantsHandler::new(store.clone(), granter.clone());
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                match redrive.handle().await {
                    Ok(report) if report.swept > 0 => {
                        tracing::info!(?report, "re-drive pass finished");
                    }
                    Ok(_) => {}
                    Err(err) => tracing::error!(error = %err, "re-drive pass failed"),
                }
            }
        });
    }

    let state = AppState {
        store,
        gateway,
        granter,
        tracker: tracker.clone(),
        preauthorized: tracker,
        authority,
        catalog: config.plans.catalog()?,
        webhook_secret: config.gateway.webhook_secret.clone(),
    };

    let app = app_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .with_state(state);

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "vip-gate listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
}
