//! Commands module - CLI command implementations.
//!
//! Each command is implemented in its own module for separation of concerns.

use std::sync::Arc;

use apalis_sql::postgres::PostgresStorage;
use apalis_sql::sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::infra::{Cache, CacheStore, Database, DocumentStorage, LocalStorage};
use crate::jobs::{EmailJob, LogMailer, Mailer, QueueMailer};
use crate::services::Services;

pub mod jobs;
pub mod migrate;
pub mod registrations;
pub mod serve;
pub mod super_owner;

/// Connect to the apalis email queue, creating its tables when missing.
pub(crate) async fn connect_queue(
    config: &Config,
    max_connections: u32,
) -> AppResult<PostgresStorage<EmailJob>> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| AppError::internal(format!("Failed to connect to database: {}", e)))?;

    PostgresStorage::setup(&pool)
        .await
        .map_err(|e| AppError::internal(format!("Failed to setup job storage: {}", e)))?;

    Ok(PostgresStorage::new(pool))
}

/// Queue-backed mailer, or a logging one when the queue can't be reached.
pub(crate) async fn mailer(config: &Config) -> Arc<dyn Mailer> {
    match connect_queue(config, 2).await {
        Ok(storage) => Arc::new(QueueMailer::new(storage)),
        Err(e) => {
            tracing::warn!(error = %e, "Email queue unavailable, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

/// Database, cache and the service graph for one-shot commands.
pub(crate) async fn connect_services(config: &Config) -> AppResult<Services> {
    let db = Database::connect(config)
        .await
        .map_err(|e| AppError::internal(format!("Database connection failed: {}", e)))?;
    let cache: Arc<dyn CacheStore> = Arc::new(
        Cache::connect(config)
            .await
            .map_err(|e| AppError::internal(format!("Redis connection failed: {}", e)))?,
    );
    let storage: Arc<dyn DocumentStorage> = Arc::new(LocalStorage::new(config.media_root.clone()));

    Ok(Services::from_connection(
        db.get_connection(),
        cache,
        mailer(config).await,
        storage,
        config.clone(),
    ))
}
