//! The caller's notification inbox and delivery preferences.

use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{Tenant, ValidatedJson};
use crate::api::AppState;
use crate::domain::{Notification, NotificationPreference, PreferenceUpdate};
use crate::errors::AppResult;
use crate::types::{NotificationFilter, Paginated, PaginationParams};

#[derive(Debug, Serialize, ToSchema)]
pub struct UnreadCount {
    pub unread: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MarkedRead {
    pub updated: u64,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PreferencesRequest {
    #[validate(length(min = 1, max = 20, message = "Send between 1 and 20 preference updates"))]
    pub updates: Vec<PreferenceUpdate>,
}

pub fn notification_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications))
        .route("/unread-count", get(unread_count))
        .route("/read-all", post(mark_all_read))
        .route("/preferences", get(preferences).put(update_preferences))
        .route("/:id/read", post(mark_read))
}

#[utoipa::path(
    get,
    path = "/notifications",
    tag = "Notifications",
    params(NotificationFilter, PaginationParams),
    responses((status = 200, description = "Newest first", body = NotificationPage)),
    security(("bearer_auth" = []))
)]
pub async fn list_notifications(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(filter): Query<NotificationFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Notification>>> {
    Ok(Json(
        state
            .services
            .notifications()
            .list(&ctx, filter, params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/notifications/unread-count",
    tag = "Notifications",
    responses((status = 200, description = "Unread notifications", body = UnreadCount)),
    security(("bearer_auth" = []))
)]
pub async fn unread_count(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<UnreadCount>> {
    let unread = state.services.notifications().unread_count(&ctx).await?;
    Ok(Json(UnreadCount { unread }))
}

#[utoipa::path(
    post,
    path = "/notifications/{id}/read",
    tag = "Notifications",
    params(("id" = Uuid, Path, description = "Notification id")),
    responses(
        (status = 200, description = "Notification marked read", body = Notification),
        (status = 404, description = "Not one of your notifications")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_read(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notification>> {
    Ok(Json(state.services.notifications().mark_read(&ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/notifications/read-all",
    tag = "Notifications",
    responses((status = 200, description = "Unread notifications marked read", body = MarkedRead)),
    security(("bearer_auth" = []))
)]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<MarkedRead>> {
    let updated = state.services.notifications().mark_all_read(&ctx).await?;
    Ok(Json(MarkedRead { updated }))
}

#[utoipa::path(
    get,
    path = "/notifications/preferences",
    tag = "Notifications",
    responses((status = 200, description = "One entry per notification kind", body = [NotificationPreference])),
    security(("bearer_auth" = []))
)]
pub async fn preferences(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<Vec<NotificationPreference>>> {
    Ok(Json(state.services.notifications().preferences(&ctx).await?))
}

#[utoipa::path(
    put,
    path = "/notifications/preferences",
    tag = "Notifications",
    request_body = PreferencesRequest,
    responses(
        (status = 200, description = "Saved preferences", body = [NotificationPreference]),
        (status = 400, description = "Empty or oversized update")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_preferences(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<PreferencesRequest>,
) -> AppResult<Json<Vec<NotificationPreference>>> {
    Ok(Json(
        state
            .services
            .notifications()
            .update_preferences(&ctx, payload.updates)
            .await?,
    ))
}
