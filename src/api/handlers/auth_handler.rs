//! Authentication handlers.

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::errors::AppResult;
use crate::services::{ProfileResponse, ProfileUpdate, TokenResponse};
use crate::types::MessageResponse;

/// User login request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    /// Username or email address
    #[validate(length(min = 1, message = "Username or email is required"))]
    #[schema(example = "acme_owner")]
    pub username: String,
    #[validate(length(min = 1, message = "Password is required"))]
    #[schema(example = "SecurePass123!")]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    #[schema(min_length = 8)]
    pub new_password: String,
}

/// Public authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

/// Authentication routes for signed-in users
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/logout", post(logout))
        .route("/me", get(me).put(update_me))
        .route("/password", post(change_password))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account not activated")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    let token = state
        .services
        .auth()
        .login(payload.username, payload.password)
        .await?;

    Ok(Json(token))
}

/// Revoke the current token
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Authentication",
    responses((status = 200, description = "Logged out", body = MessageResponse)),
    security(("bearer_auth" = []))
)]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<MessageResponse> {
    state.services.auth().logout(&user.claims).await?;
    Ok(MessageResponse::new("Logged out"))
}

/// The caller's account, profile and super-owner record
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Authentication",
    responses((status = 200, description = "Current account", body = ProfileResponse)),
    security(("bearer_auth" = []))
)]
pub async fn me(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(state.services.auth().profile(user.id).await?))
}

#[utoipa::path(
    put,
    path = "/auth/me",
    tag = "Authentication",
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Profile updated", body = ProfileResponse),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_me(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ProfileUpdate>,
) -> AppResult<Json<ProfileResponse>> {
    Ok(Json(
        state.services.auth().update_profile(user.id, payload).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/auth/password",
    tag = "Authentication",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 400, description = "Current password is incorrect")
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(payload): ValidatedJson<ChangePasswordRequest>,
) -> AppResult<MessageResponse> {
    state
        .services
        .auth()
        .change_password(user.id, payload.current_password, payload.new_password)
        .await?;
    Ok(MessageResponse::new("Password changed"))
}
