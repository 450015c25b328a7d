//! Fund API server
//!
//! Environment:
//! - DB_URL   - PostgreSQL connection string (required)
//! - PORT     - Listen port (default: 3000)
//! - API_HOST - Bind host (default: 0.0.0.0)
//! - RUST_LOG - Log filter (default: info)

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use api::config::Config;
use api::store::PgFundReader;
use api::{create_router, AppState};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    println!("=== Fund API ===");

    // Lazy pool: the server comes up even if the database is not reachable yet
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect_lazy(&config.db_url)
        .context("Invalid database URL")?;

    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => tracing::info!("Database connected"),
        Err(e) => tracing::warn!(
            error = %e,
            "Database connection error; requests will fail until it is reachable"
        ),
    }

    let state = Arc::new(AppState {
        funds: Arc::new(PgFundReader::new(pool)),
    });
    let app = create_router(state);

    let bind = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;

    println!("Server is listening on port {}", config.port);
    println!("\nEndpoints:");
    println!("  GET /");
    println!("  GET /funds");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
