//! Application route configuration.

use axum::{
    http::{header, HeaderValue, Method},
    middleware,
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{
    auth_routes, company_routes, contractor_routes, dashboard_routes, expense_routes,
    health_routes, notification_routes, project_routes, registration_routes, session_routes,
    status_routes, super_owner_routes,
};
use super::middleware::{auth_middleware, rate_limit_auth_middleware, rate_limit_middleware};
use super::openapi::ApiDoc;
use super::AppState;

/// Create the application router with all routes configured.
///
/// `site_url` is the front end origin allowed by CORS, besides localhost.
pub fn create_router(state: AppState, site_url: &str) -> Router {
    // Public endpoints that create accounts or check credentials (stricter rate limiting)
    let auth_limit = middleware::from_fn_with_state(state.clone(), rate_limit_auth_middleware);

    let authentication = auth_routes()
        .route_layer(auth_limit.clone())
        .merge(protect(session_routes(), &state));

    // Everything below requires a JWT + general rate limiting
    let tenant = Router::new()
        .merge(company_routes())
        .merge(dashboard_routes())
        .nest("/projects", project_routes())
        .nest("/expenses", expense_routes())
        .nest("/contractors", contractor_routes())
        .nest("/notifications", notification_routes());

    Router::new()
        .route("/", get(root))
        // Health check endpoints (no rate limiting)
        .merge(health_routes())
        .merge(status_routes())
        // OpenAPI Swagger UI documentation
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/auth", authentication)
        .merge(registration_routes().route_layer(auth_limit))
        .nest("/super-owner", protect(super_owner_routes(), &state))
        .merge(protect(tenant, &state))
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(site_url))
        .with_state(state)
}

/// Require a valid token; rate limiting runs first
fn protect(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

fn cors_layer(site_url: &str) -> CorsLayer {
    let site_origin = site_url.trim_end_matches('/').to_string();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _parts: &axum::http::request::Parts| {
                let origin = origin.to_str().unwrap_or_default();
                origin == site_origin
                    || origin.starts_with("http://localhost")
                    || origin.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Root endpoint
async fn root() -> &'static str {
    "Construction Tracker API"
}
