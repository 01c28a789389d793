//! Contractor handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::api::extractors::{Tenant, ValidatedJson};
use crate::api::AppState;
use crate::domain::{Contractor, ContractorInput};
use crate::errors::AppResult;
use crate::types::{Paginated, PaginationParams, SearchFilter};

/// Create contractor routes
pub fn contractor_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_contractors).post(create_contractor))
        .route(
            "/:id",
            get(get_contractor)
                .put(update_contractor)
                .delete(delete_contractor),
        )
}

#[utoipa::path(
    get,
    path = "/contractors",
    tag = "Contractors",
    params(SearchFilter, PaginationParams),
    responses((status = 200, description = "Paginated contractors", body = ContractorPage)),
    security(("bearer_auth" = []))
)]
pub async fn list_contractors(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(filter): Query<SearchFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Contractor>>> {
    Ok(Json(
        state
            .services
            .contractors()
            .list(&ctx, filter, params)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "Contractor id")),
    responses(
        (status = 200, description = "Contractor found", body = Contractor),
        (status = 404, description = "Contractor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Contractor>> {
    Ok(Json(state.services.contractors().get(&ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/contractors",
    tag = "Contractors",
    request_body = ContractorInput,
    responses(
        (status = 201, description = "Contractor created", body = Contractor),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<ContractorInput>,
) -> AppResult<(StatusCode, Json<Contractor>)> {
    let contractor = state.services.contractors().create(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(contractor)))
}

#[utoipa::path(
    put,
    path = "/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "Contractor id")),
    request_body = ContractorInput,
    responses(
        (status = 200, description = "Contractor updated", body = Contractor),
        (status = 404, description = "Contractor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ContractorInput>,
) -> AppResult<Json<Contractor>> {
    Ok(Json(
        state
            .services
            .contractors()
            .update(&ctx, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/contractors/{id}",
    tag = "Contractors",
    params(("id" = Uuid, Path, description = "Contractor id")),
    responses(
        (status = 204, description = "Contractor deleted"),
        (status = 404, description = "Contractor not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.contractors().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
