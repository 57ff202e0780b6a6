//! Friend-alerting HTTP server.

use std::sync::Arc;

use api::{AppState, Config};
use database::Database;
use safety_core::{Engine, LoggingSink, SystemClock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting API server");

    let db = Database::connect_with_pool_size(&config.database_url, config.pool_size).await?;
    db.migrate().await?;

    // Push delivery is handled downstream; events are logged here.
    let engine = Engine::new(
        db,
        config.engine.clone(),
        Arc::new(SystemClock),
        Arc::new(LoggingSink),
    );

    api::sweeper::spawn(engine.checkins().clone(), config.sweep_interval);

    let app = api::app(AppState::new(engine));

    info!(addr = %config.addr, "API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
