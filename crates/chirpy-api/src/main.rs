//! Chirpy API Server
//!
//! Author: bailey4770

use chirpy_api::{create_router, state::AppState};
use chirpy_core::config::{AppConfig, LoggingConfig};
use chirpy_core::PgStore;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn init_tracing(logging: &LoggingConfig) {
    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chirpy_api={level},chirpy_core={level},audit=info,tower_http=info",
            level = logging.level
        ))
    });

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = match config.database.url.clone() {
        Some(url) => {
            let store = Arc::new(PgStore::connect(&url, config.database.pool_size).await?);
            store.ensure_schema().await?;
            tracing::info!("Connected to PostgreSQL");
            AppState::new(config, store.clone(), store)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory store");
            AppState::in_memory(config)
        }
    };

    if state.config.auth.polka_key.is_none() {
        tracing::warn!("POLKA_KEY not set, webhook calls will be rejected");
    }

    let app = create_router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Chirpy API Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
