//! Company dashboard.

use axum::{extract::State, response::Json, routing::get, Router};

use crate::api::extractors::Tenant;
use crate::api::AppState;
use crate::domain::DashboardSummary;
use crate::errors::AppResult;

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Financial overview, status breakdowns and the monthly spending trend
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "Dashboard",
    responses(
        (status = 200, description = "Dashboard summary", body = DashboardSummary),
        (status = 403, description = "Missing projects:view permission")
    ),
    security(("bearer_auth" = []))
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<DashboardSummary>> {
    Ok(Json(state.services.dashboard().summary(&ctx).await?))
}
