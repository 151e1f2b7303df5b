use anyhow::Context;
use axum::{extract::Request, ServiceExt};
use tracing_subscriber::EnvFilter;

use caseflow_api::{app, config, database, is_production, services, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")))
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config().clone();
    tracing::info!("Starting Caseflow API in {:?} mode", config.environment);

    if config.security.jwt_secret.is_empty() {
        anyhow::bail!("JWT_SECRET must be set");
    }
    if is_production!() && config.bootstrap.admin_password.as_deref() == Some("admin") {
        tracing::warn!("Bootstrap administrator is using the default password");
    }

    let store = database::connect(&config.database)
        .await
        .context("failed to open the database")?;
    services::ensure_admin(store.as_ref(), &config)
        .await
        .context("failed to create the bootstrap administrator")?;

    let bind_addr = format!("{}:{}", config.server.bind_host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Caseflow API listening on http://{}", bind_addr);

    let app = app(AppState::new(store, config));
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .context("server error")?;

    Ok(())
}
