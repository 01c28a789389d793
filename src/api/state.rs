//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::{CacheStore, Database, DocumentStorage, LocalStorage};
use crate::jobs::Mailer;
use crate::services::{ServiceContainer, Services};

/// Application state shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Every use case, behind its trait
    pub services: Arc<dyn ServiceContainer>,
    /// Redis cache (rate limits, revocations, health)
    pub cache: Arc<dyn CacheStore>,
    /// Database connection (health checks)
    pub database: Arc<Database>,
}

impl AppState {
    /// Wire the production services over the given infrastructure.
    pub fn from_config(
        database: Arc<Database>,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
        config: Config,
    ) -> Self {
        let storage: Arc<dyn DocumentStorage> =
            Arc::new(LocalStorage::new(config.media_root.clone()));
        let services = Arc::new(Services::from_connection(
            database.get_connection(),
            cache.clone(),
            mailer,
            storage,
            config,
        ));

        Self::new(services, cache, database)
    }

    /// Create application state with manually injected services.
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        cache: Arc<dyn CacheStore>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            services,
            cache,
            database,
        }
    }
}
