use std::net::SocketAddr;

use anyhow::Context;
use coin_tracker::config::Config;
use coin_tracker::db::{create_pool, run_migrations};
use coin_tracker::{build_router, AppState};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coin_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    tracing::info!("Starting coin-tracker API server...");
    tracing::info!("Connecting to database...");

    let pool = create_pool(&config.database_url, config.database_max_connections)
        .await
        .with_context(|| format!("Failed to open database {}", config.database_url))?;
    run_migrations(&pool)
        .await
        .context("Failed to apply database migrations")?;
    tracing::info!("Database connection established");

    let app = build_router(AppState::new(pool));

    let addr: SocketAddr = config.server_addr().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
