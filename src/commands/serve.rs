//! Serve command - Starts the HTTP server.

use std::net::SocketAddr;
use std::sync::Arc;

use super::mailer;
use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, CacheStore, Database};

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: Config) -> AppResult<()> {
    tracing::info!("Starting server...");

    let db = Arc::new(
        Database::connect(&config)
            .await
            .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?,
    );

    let cache: Arc<dyn CacheStore> = Arc::new(
        Cache::connect(&config)
            .await
            .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?,
    );

    // Emails go through the apalis queue; `jobs work` delivers them
    let mailer = mailer(&config).await;

    let site_url = config.site_url.clone();
    let app_state = AppState::from_config(db, cache, mailer, config);
    let app = create_router(app_state, &site_url);

    let addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    // Peer addresses feed rate limiting and registration metadata
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Received shutdown signal");
}
