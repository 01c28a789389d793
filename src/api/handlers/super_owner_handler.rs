//! Super-owner console: registration review, documents, companies, users
//! and system analytics.

use axum::{
    extract::{Path, Query, State},
    http::{
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
        StatusCode,
    },
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{SuperOwnerActor, ValidatedJson};
use crate::api::AppState;
use crate::domain::{
    Company, CompanyStats, Document, RegistrationRequest, SuperOwner, UserResponse,
};
use crate::errors::AppResult;
use crate::services::{
    ApprovalOutcome, BulkActionReport, BulkActionRequest, CompanyDetail, DocumentReview,
    ExportKind, NewSuperOwnerRequest, RegistrationDetail, SuperOwnerView, SystemAnalytics, UserDetail,
};
use crate::types::{Paginated, PaginationParams, RequestFilter, SearchFilter};

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct DocumentsRequiredRequest {
    /// Shown to the applicant in the notification email
    #[validate(length(max = 2000, message = "Message is too long"))]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RejectRequest {
    #[validate(length(min = 1, max = 2000, message = "A rejection reason is required"))]
    #[schema(example = "Registration certificate could not be verified")]
    pub reason: String,
}

/// Create super-owner routes
pub fn super_owner_routes() -> Router<AppState> {
    Router::new()
        .route("/registrations", get(list_registrations))
        .route("/registrations/bulk", post(bulk_action))
        .route("/registrations/:id", get(get_registration))
        .route("/registrations/:id/review", post(mark_under_review))
        .route("/registrations/:id/documents-required", post(require_documents))
        .route("/registrations/:id/approve", post(approve))
        .route("/registrations/:id/reject", post(reject))
        .route("/registrations/:id/documents", get(list_documents))
        .route("/documents/:id/review", post(review_document))
        .route("/documents/:id/download", get(download_document))
        .route("/companies", get(list_companies))
        .route("/companies/:id", get(company_detail))
        .route("/companies/:id/toggle-status", post(toggle_company_status))
        .route("/companies/:id/stats", get(company_stats))
        .route("/users", get(list_users))
        .route("/users/:id", get(user_detail))
        .route("/users/:id/toggle-status", post(toggle_user_status))
        .route("/super-owners", get(list_super_owners).post(create_super_owner))
        .route("/analytics", get(system_analytics))
        .route("/export/:kind", get(export_data))
}

// =============================================================================
// Registrations
// =============================================================================

#[utoipa::path(
    get,
    path = "/super-owner/registrations",
    tag = "Super Owner",
    params(RequestFilter, PaginationParams),
    responses(
        (status = 200, description = "Registration requests", body = RegistrationPage),
        (status = 403, description = "Not permitted")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_registrations(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Query(filter): Query<RequestFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<RegistrationRequest>>> {
    let page = state
        .services
        .registrations()
        .list(&actor, filter, params)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/super-owner/registrations/{id}",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request with documents", body = RegistrationDetail),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_registration(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RegistrationDetail>> {
    Ok(Json(state.services.registrations().get(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/super-owner/registrations/{id}/review",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Request under review", body = RegistrationRequest),
        (status = 409, description = "Invalid status transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_under_review(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RegistrationRequest>> {
    Ok(Json(
        state
            .services
            .registrations()
            .mark_under_review(&actor, id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/super-owner/registrations/{id}/documents-required",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    request_body = DocumentsRequiredRequest,
    responses(
        (status = 200, description = "Applicant asked for documents", body = RegistrationRequest),
        (status = 409, description = "Invalid status transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn require_documents(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DocumentsRequiredRequest>,
) -> AppResult<Json<RegistrationRequest>> {
    Ok(Json(
        state
            .services
            .registrations()
            .require_documents(&actor, id, payload.message)
            .await?,
    ))
}

/// Approve a request and provision its accounts
#[utoipa::path(
    post,
    path = "/super-owner/registrations/{id}/approve",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    responses(
        (status = 200, description = "Accounts created", body = ApprovalOutcome),
        (status = 400, description = "Request expired"),
        (status = 409, description = "Invalid status transition or duplicate account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApprovalOutcome>> {
    Ok(Json(state.services.registrations().approve(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/super-owner/registrations/{id}/reject",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    request_body = RejectRequest,
    responses(
        (status = 200, description = "Request rejected", body = RegistrationRequest),
        (status = 409, description = "Invalid status transition")
    ),
    security(("bearer_auth" = []))
)]
pub async fn reject(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<RejectRequest>,
) -> AppResult<Json<RegistrationRequest>> {
    Ok(Json(
        state
            .services
            .registrations()
            .reject(&actor, id, payload.reason)
            .await?,
    ))
}

/// Approve or reject several requests; failures are reported per request
#[utoipa::path(
    post,
    path = "/super-owner/registrations/bulk",
    tag = "Super Owner",
    request_body = BulkActionRequest,
    responses(
        (status = 200, description = "Per-request outcome", body = BulkActionReport),
        (status = 400, description = "Too many ids or missing reason")
    ),
    security(("bearer_auth" = []))
)]
pub async fn bulk_action(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    ValidatedJson(payload): ValidatedJson<BulkActionRequest>,
) -> AppResult<Json<BulkActionReport>> {
    Ok(Json(
        state
            .services
            .registrations()
            .bulk_action(&actor, payload)
            .await?,
    ))
}

// =============================================================================
// Documents
// =============================================================================

#[utoipa::path(
    get,
    path = "/super-owner/registrations/{id}/documents",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Request id")),
    responses((status = 200, description = "Uploaded documents", body = [Document])),
    security(("bearer_auth" = []))
)]
pub async fn list_documents(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<Document>>> {
    Ok(Json(
        state
            .services
            .documents()
            .list_for_request(&actor, id)
            .await?,
    ))
}

#[utoipa::path(
    post,
    path = "/super-owner/documents/{id}/review",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Document id")),
    request_body = DocumentReview,
    responses((status = 200, description = "Document reviewed", body = Document)),
    security(("bearer_auth" = []))
)]
pub async fn review_document(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<DocumentReview>,
) -> AppResult<Json<Document>> {
    Ok(Json(
        state
            .services
            .documents()
            .review(&actor, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/super-owner/documents/{id}/download",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Document id")),
    responses(
        (status = 200, description = "File contents"),
        (status = 404, description = "Not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn download_document(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let download = state.services.documents().download(&actor, id).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        download.filename.replace(['"', '\\'], "_")
    );

    Ok((
        StatusCode::OK,
        [(CONTENT_TYPE, download.content_type), (CONTENT_DISPOSITION, disposition)],
        download.bytes,
    ))
}

// =============================================================================
// Companies
// =============================================================================

#[utoipa::path(
    get,
    path = "/super-owner/companies",
    tag = "Super Owner",
    params(SearchFilter, PaginationParams),
    responses((status = 200, description = "Companies in scope", body = CompanyPage)),
    security(("bearer_auth" = []))
)]
pub async fn list_companies(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Query(filter): Query<SearchFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Company>>> {
    let page = state
        .services
        .super_owner()
        .list_companies(&actor, filter.search, params)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/super-owner/companies/{id}",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Company with statistics", body = CompanyDetail)),
    security(("bearer_auth" = []))
)]
pub async fn company_detail(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompanyDetail>> {
    Ok(Json(
        state.services.super_owner().company_detail(&actor, id).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/super-owner/companies/{id}/toggle-status",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Company activated or deactivated", body = Company)),
    security(("bearer_auth" = []))
)]
pub async fn toggle_company_status(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Company>> {
    Ok(Json(
        state
            .services
            .super_owner()
            .toggle_company_status(&actor, id)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/super-owner/companies/{id}/stats",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "Company id")),
    responses((status = 200, description = "Company statistics", body = CompanyStats)),
    security(("bearer_auth" = []))
)]
pub async fn company_stats(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<CompanyStats>> {
    Ok(Json(
        state.services.super_owner().company_stats(&actor, id).await?,
    ))
}

// =============================================================================
// Users
// =============================================================================

#[utoipa::path(
    get,
    path = "/super-owner/users",
    tag = "Super Owner",
    params(SearchFilter, PaginationParams),
    responses((status = 200, description = "User accounts", body = UserPage)),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Query(filter): Query<SearchFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<UserResponse>>> {
    let page = state
        .services
        .super_owner()
        .list_users(&actor, filter.search, params)
        .await?;
    Ok(Json(page))
}

#[utoipa::path(
    get,
    path = "/super-owner/users/{id}",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "User id")),
    responses((status = 200, description = "Account detail", body = UserDetail)),
    security(("bearer_auth" = []))
)]
pub async fn user_detail(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserDetail>> {
    Ok(Json(state.services.super_owner().user_detail(&actor, id).await?))
}

#[utoipa::path(
    post,
    path = "/super-owner/users/{id}/toggle-status",
    tag = "Super Owner",
    params(("id" = Uuid, Path, description = "User id")),
    responses(
        (status = 200, description = "Account activated or deactivated", body = UserResponse),
        (status = 400, description = "Own or primary owner account")
    ),
    security(("bearer_auth" = []))
)]
pub async fn toggle_user_status(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    Ok(Json(
        state
            .services
            .super_owner()
            .toggle_user_status(&actor, id)
            .await?,
    ))
}

// =============================================================================
// Super owners and analytics
// =============================================================================

#[utoipa::path(
    get,
    path = "/super-owner/super-owners",
    tag = "Super Owner",
    responses((status = 200, description = "Super owners", body = [SuperOwnerView])),
    security(("bearer_auth" = []))
)]
pub async fn list_super_owners(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
) -> AppResult<Json<Vec<SuperOwnerView>>> {
    Ok(Json(state.services.super_owner().list_super_owners(&actor).await?))
}

/// Delegate super-owner rights to an existing user
#[utoipa::path(
    post,
    path = "/super-owner/super-owners",
    tag = "Super Owner",
    request_body = NewSuperOwnerRequest,
    responses(
        (status = 201, description = "Super owner created", body = SuperOwner),
        (status = 403, description = "Cannot delegate these rights"),
        (status = 409, description = "User is already a super owner")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_super_owner(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    ValidatedJson(payload): ValidatedJson<NewSuperOwnerRequest>,
) -> AppResult<(StatusCode, Json<SuperOwner>)> {
    let owner = state
        .services
        .super_owner()
        .create_super_owner(&actor, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(owner)))
}

#[utoipa::path(
    get,
    path = "/super-owner/analytics",
    tag = "Super Owner",
    responses((status = 200, description = "System-wide figures", body = SystemAnalytics)),
    security(("bearer_auth" = []))
)]
pub async fn system_analytics(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
) -> AppResult<Json<SystemAnalytics>> {
    Ok(Json(state.services.super_owner().system_analytics(&actor).await?))
}

#[utoipa::path(
    get,
    path = "/super-owner/export/{kind}",
    tag = "Super Owner",
    params(("kind" = ExportKind, Path, description = "companies, users or requests")),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 400, description = "Unknown export"),
        (status = 403, description = "Not permitted")
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_data(
    State(state): State<AppState>,
    SuperOwnerActor(actor): SuperOwnerActor,
    Path(kind): Path<String>,
) -> AppResult<impl IntoResponse> {
    let kind: ExportKind = kind.parse()?;
    let export = state.services.super_owner().export(&actor, kind).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        export.bytes,
    ))
}
