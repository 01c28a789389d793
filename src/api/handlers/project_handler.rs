//! Project handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::{Tenant, ValidatedJson};
use crate::api::AppState;
use crate::domain::{AssignmentInput, ContractorAssignment, Project, ProjectInput};
use crate::errors::AppResult;
use crate::services::ProjectDetail;
use crate::types::{Paginated, PaginationParams, ProjectFilter};

/// Create project routes
pub fn project_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/:id",
            get(get_project).put(update_project).delete(delete_project),
        )
        .route("/:id/contractors", post(assign_contractor))
        .route("/:id/contractors/:assignment_id", delete(remove_contractor))
}

/// List projects of the current company
#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    params(ProjectFilter, PaginationParams),
    responses((status = 200, description = "Paginated projects", body = ProjectPage)),
    security(("bearer_auth" = []))
)]
pub async fn list_projects(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(filter): Query<ProjectFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<Project>>> {
    Ok(Json(
        state.services.projects().list(&ctx, filter, params).await?,
    ))
}

/// Project with financials and assigned contractors
#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project found", body = ProjectDetail),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProjectDetail>> {
    Ok(Json(state.services.projects().get(&ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = ProjectInput,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<ProjectInput>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let project = state.services.projects().create(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    put,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = ProjectInput,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Project not found"),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_project(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ProjectInput>,
) -> AppResult<Json<Project>> {
    Ok(Json(
        state.services.projects().update(&ctx, id, payload).await?,
    ))
}

/// Delete a project and its expenses
#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 404, description = "Project not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_project(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.projects().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/projects/{id}/contractors",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = AssignmentInput,
    responses(
        (status = 201, description = "Contractor assigned", body = ContractorAssignment),
        (status = 409, description = "Contractor already holds this role")
    ),
    security(("bearer_auth" = []))
)]
pub async fn assign_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignmentInput>,
) -> AppResult<(StatusCode, Json<ContractorAssignment>)> {
    let assignment = state
        .services
        .projects()
        .assign_contractor(&ctx, id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(assignment)))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}/contractors/{assignment_id}",
    tag = "Projects",
    params(
        ("id" = Uuid, Path, description = "Project id"),
        ("assignment_id" = Uuid, Path, description = "Assignment id")
    ),
    responses(
        (status = 204, description = "Assignment removed"),
        (status = 404, description = "Assignment not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn remove_contractor(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path((id, assignment_id)): Path<(Uuid, Uuid)>,
) -> AppResult<StatusCode> {
    state
        .services
        .projects()
        .remove_contractor(&ctx, id, assignment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
