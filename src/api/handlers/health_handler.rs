//! Health, readiness and liveness checks.

use axum::{extract::State, http::StatusCode, response::Json, routing::get, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use crate::api::AppState;

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub services: ServiceHealth,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceHealth {
    pub database: ServiceStatus,
    pub cache: ServiceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServiceStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceStatus {
    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                status: "healthy".to_string(),
                error: None,
            },
            Err(e) => Self {
                status: "unhealthy".to_string(),
                error: Some(e.to_string()),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.error.is_none()
    }
}

/// Health check with database and cache connectivity
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health/", get(health))
}

/// Stateless readiness and liveness answers for orchestrators
pub fn status_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route("/ready/", get(ready))
        .route("/alive/", get(alive))
}

#[utoipa::path(
    get,
    path = "/health/",
    tag = "Health",
    responses(
        (status = 200, description = "All dependencies reachable", body = HealthResponse),
        (status = 503, description = "A dependency is unreachable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (database, cache) = tokio::join!(state.database.ping(), state.cache.ping());
    let database = ServiceStatus::from_result(database);
    let cache = ServiceStatus::from_result(cache);

    let healthy = database.is_healthy() && cache.is_healthy();
    if !healthy {
        tracing::warn!(
            database = ?database.error,
            cache = ?cache.error,
            "Health check degraded"
        );
    }

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: Utc::now(),
            services: ServiceHealth { database, cache },
        }),
    )
}

#[utoipa::path(
    get,
    path = "/ready/",
    tag = "Health",
    responses((status = 200, description = "Ready to serve traffic"))
)]
pub async fn ready() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}

#[utoipa::path(
    get,
    path = "/alive/",
    tag = "Health",
    responses((status = 200, description = "Process is alive"))
)]
pub async fn alive() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_status_from_result() {
        let ok = ServiceStatus::from_result::<String>(Ok(()));
        assert!(ok.is_healthy());
        assert_eq!(ok.status, "healthy");

        let failed = ServiceStatus::from_result(Err("connection refused"));
        assert!(!failed.is_healthy());
        assert_eq!(failed.status, "unhealthy");
        assert_eq!(failed.error.as_deref(), Some("connection refused"));
    }
}
