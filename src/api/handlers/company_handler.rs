//! Company context, roles and members.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::{Tenant, ValidatedJson};
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{Role, TenantContext};
use crate::errors::AppResult;
use crate::services::{CompanySummary, InviteMemberRequest, MemberUpdate, MemberView, RoleInput};

/// Create company routes
pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/companies/mine", get(my_companies))
        .route("/companies/switch/:id", post(switch_company))
        .route("/company/roles", get(list_roles).post(create_role))
        .route("/company/roles/:id", put(update_role).delete(delete_role))
        .route("/company/members", get(list_members).post(invite_member))
        .route("/company/members/:id", put(update_member))
}

#[utoipa::path(
    get,
    path = "/companies/mine",
    tag = "Company",
    responses((status = 200, description = "Companies the caller belongs to", body = [CompanySummary])),
    security(("bearer_auth" = []))
)]
pub async fn my_companies(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<CompanySummary>>> {
    Ok(Json(state.services.tenancy().my_companies(user.id).await?))
}

/// Make another company the caller's current one
#[utoipa::path(
    post,
    path = "/companies/switch/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Company id")),
    responses(
        (status = 200, description = "New company context", body = TenantContext),
        (status = 403, description = "No active membership")
    ),
    security(("bearer_auth" = []))
)]
pub async fn switch_company(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TenantContext>> {
    Ok(Json(
        state.services.tenancy().switch_company(user.id, id).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/company/roles",
    tag = "Company",
    responses((status = 200, description = "Roles of the current company", body = [Role])),
    security(("bearer_auth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<Vec<Role>>> {
    Ok(Json(state.services.tenancy().list_roles(&ctx).await?))
}

#[utoipa::path(
    post,
    path = "/company/roles",
    tag = "Company",
    request_body = RoleInput,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<RoleInput>,
) -> AppResult<(StatusCode, Json<Role>)> {
    let role = state.services.tenancy().create_role(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    put,
    path = "/company/roles/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Role id")),
    request_body = RoleInput,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Would remove the last admin role")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RoleInput>,
) -> AppResult<Json<Role>> {
    Ok(Json(
        state
            .services
            .tenancy()
            .update_role(&ctx, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/company/roles/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Role id")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 400, description = "Role still assigned or last admin role")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.tenancy().delete_role(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/company/members",
    tag = "Company",
    responses((status = 200, description = "Members of the current company", body = [MemberView])),
    security(("bearer_auth" = []))
)]
pub async fn list_members(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<Vec<MemberView>>> {
    Ok(Json(state.services.tenancy().list_members(&ctx).await?))
}

/// Add a user to the company, creating the account when the email is unknown
#[utoipa::path(
    post,
    path = "/company/members",
    tag = "Company",
    request_body = InviteMemberRequest,
    responses(
        (status = 201, description = "Member added", body = MemberView),
        (status = 409, description = "Already a member")
    ),
    security(("bearer_auth" = []))
)]
pub async fn invite_member(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<InviteMemberRequest>,
) -> AppResult<(StatusCode, Json<MemberView>)> {
    let member = state.services.tenancy().invite_member(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(member)))
}

#[utoipa::path(
    put,
    path = "/company/members/{id}",
    tag = "Company",
    params(("id" = Uuid, Path, description = "Membership id")),
    request_body = MemberUpdate,
    responses(
        (status = 200, description = "Membership updated", body = MemberView),
        (status = 400, description = "Own membership or last admin")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_member(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<MemberUpdate>,
) -> AppResult<Json<MemberView>> {
    Ok(Json(
        state
            .services
            .tenancy()
            .update_member(&ctx, id, payload)
            .await?,
    ))
}
