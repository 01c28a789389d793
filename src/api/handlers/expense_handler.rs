//! Expense and expense category handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use uuid::Uuid;

use crate::api::extractors::{Tenant, ValidatedJson};
use crate::api::AppState;
use crate::domain::{ExpenseCategory, ExpenseInput};
use crate::errors::AppResult;
use crate::services::{CategoryInput, ExpenseView, MarkPaidRequest};
use crate::types::{ExpenseFilter, Paginated, PaginationParams};

/// Create expense routes
pub fn expense_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(create_expense))
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/:id",
            put(update_category).delete(delete_category),
        )
        .route(
            "/:id",
            get(get_expense).put(update_expense).delete(delete_expense),
        )
        .route("/:id/approve", post(approve_expense))
        .route("/:id/pay", post(mark_paid))
}

#[utoipa::path(
    get,
    path = "/expenses",
    tag = "Expenses",
    params(ExpenseFilter, PaginationParams),
    responses((status = 200, description = "Paginated expenses", body = ExpensePage)),
    security(("bearer_auth" = []))
)]
pub async fn list_expenses(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Query(filter): Query<ExpenseFilter>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Paginated<ExpenseView>>> {
    Ok(Json(
        state.services.expenses().list(&ctx, filter, params).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense found", body = ExpenseView),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_expense(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ExpenseView>> {
    Ok(Json(state.services.expenses().get(&ctx, id).await?))
}

#[utoipa::path(
    post,
    path = "/expenses",
    tag = "Expenses",
    request_body = ExpenseInput,
    responses(
        (status = 201, description = "Expense recorded", body = ExpenseView),
        (status = 400, description = "Validation error or foreign reference")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_expense(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<ExpenseInput>,
) -> AppResult<(StatusCode, Json<ExpenseView>)> {
    let expense = state.services.expenses().create(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

#[utoipa::path(
    put,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Expense id")),
    request_body = ExpenseInput,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseView),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_expense(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<ExpenseInput>,
) -> AppResult<Json<ExpenseView>> {
    Ok(Json(
        state.services.expenses().update(&ctx, id, payload).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/expenses/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 204, description = "Expense deleted"),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_expense(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.expenses().delete(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/expenses/{id}/approve",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Expense id")),
    responses(
        (status = 200, description = "Expense approved", body = ExpenseView),
        (status = 403, description = "Missing approve permission")
    ),
    security(("bearer_auth" = []))
)]
pub async fn approve_expense(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ExpenseView>> {
    Ok(Json(state.services.expenses().approve(&ctx, id).await?))
}

/// Mark an expense paid; the date defaults to today
#[utoipa::path(
    post,
    path = "/expenses/{id}/pay",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Expense id")),
    request_body = MarkPaidRequest,
    responses(
        (status = 200, description = "Expense paid", body = ExpenseView),
        (status = 404, description = "Expense not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn mark_paid(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    payload: Option<Json<MarkPaidRequest>>,
) -> AppResult<Json<ExpenseView>> {
    let paid_date = payload.and_then(|Json(body)| body.paid_date);
    Ok(Json(
        state
            .services
            .expenses()
            .mark_paid(&ctx, id, paid_date)
            .await?,
    ))
}

#[utoipa::path(
    get,
    path = "/expenses/categories",
    tag = "Expenses",
    responses((status = 200, description = "Expense categories", body = [ExpenseCategory])),
    security(("bearer_auth" = []))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
) -> AppResult<Json<Vec<ExpenseCategory>>> {
    Ok(Json(state.services.expenses().list_categories(&ctx).await?))
}

#[utoipa::path(
    post,
    path = "/expenses/categories",
    tag = "Expenses",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Category created", body = ExpenseCategory),
        (status = 409, description = "Name already used")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    ValidatedJson(payload): ValidatedJson<CategoryInput>,
) -> AppResult<(StatusCode, Json<ExpenseCategory>)> {
    let category = state
        .services
        .expenses()
        .create_category(&ctx, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[utoipa::path(
    put,
    path = "/expenses/categories/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Category id")),
    request_body = CategoryInput,
    responses(
        (status = 200, description = "Category updated", body = ExpenseCategory),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
    ValidatedJson(payload): ValidatedJson<CategoryInput>,
) -> AppResult<Json<ExpenseCategory>> {
    Ok(Json(
        state
            .services
            .expenses()
            .update_category(&ctx, id, payload)
            .await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/expenses/categories/{id}",
    tag = "Expenses",
    params(("id" = Uuid, Path, description = "Category id")),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 404, description = "Category not found")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_category(
    State(state): State<AppState>,
    Tenant(ctx): Tenant,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.expenses().delete_category(&ctx, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
