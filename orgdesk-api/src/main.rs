//! # OrgDesk API Server
//!
//! Multi-tenant workspace API: organizations, invites, projects, tasks and
//! an audited activity feed.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgres://localhost/orgdesk IDENTITY_JWT_SECRET=... cargo run -p orgdesk-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON log lines.

use anyhow::Context;
use orgdesk_api::{
    app::{build_router, AppState},
    config::Config,
};
use orgdesk_shared::db::{migrations::run_migrations, pool};
use orgdesk_shared::store::PgStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("OrgDesk API Server v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env().context("Failed to load configuration")?;

    let pool = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("Failed to connect to database")?;

    if config.database.run_migrations {
        run_migrations(&pool).await.context("Failed to run migrations")?;
    }

    let bind_address = config.bind_address();
    let state = AppState::new(Arc::new(PgStore::new(pool.clone())), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "orgdesk_api=debug,orgdesk_shared=info,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, draining connections...");
}
