//! Rate limiting middleware using Redis cache.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;

use crate::api::AppState;
use crate::config::{
    RATE_LIMIT_AUTH_REQUESTS, RATE_LIMIT_AUTH_WINDOW_SECONDS, RATE_LIMIT_REQUESTS,
    RATE_LIMIT_WINDOW_SECONDS,
};
use crate::infra::cache::rate_limit_key;

/// Rate limit error response
#[derive(Debug)]
pub struct RateLimitError {
    pub retry_after: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert("Retry-After", HeaderValue::from(self.retry_after));
        headers.insert("X-RateLimit-Remaining", HeaderValue::from_static("0"));

        (
            StatusCode::TOO_MANY_REQUESTS,
            headers,
            "Too many requests. Please try again later.",
        )
            .into_response()
    }
}

/// Client address for rate limiting and request metadata.
///
/// Prefers the first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|h| h.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    header("X-Forwarded-For")
        .and_then(|forwarded| forwarded.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| header("X-Real-IP").map(str::to_string))
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

fn client_identifier(request: &Request) -> String {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0);
    client_ip(request.headers(), peer).unwrap_or_else(|| "unknown".to_string())
}

async fn enforce(
    state: &AppState,
    request: Request,
    next: Next,
    scope: &str,
    limit: u64,
    window: u64,
) -> Result<Response, RateLimitError> {
    let client_id = client_identifier(&request);
    let key = rate_limit_key(&format!("{}:{}", scope, client_id));

    let count = match state.cache.increment(&key, window).await {
        Ok(count) => count,
        Err(e) => {
            // Fail closed so an unavailable Redis cannot be used to bypass limits
            tracing::error!(error = %e, scope = scope, "Rate limit check failed - denying request");
            return Err(RateLimitError {
                retry_after: window,
            });
        }
    };

    if count > limit {
        tracing::warn!(client = %client_id, scope = scope, count = count, "Rate limit exceeded");
        return Err(RateLimitError {
            retry_after: window,
        });
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
    headers.insert(
        "X-RateLimit-Remaining",
        HeaderValue::from(limit.saturating_sub(count)),
    );

    Ok(response)
}

/// General rate limiting middleware.
/// Limits requests to RATE_LIMIT_REQUESTS per RATE_LIMIT_WINDOW_SECONDS.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(
        &state,
        request,
        next,
        "general",
        RATE_LIMIT_REQUESTS,
        RATE_LIMIT_WINDOW_SECONDS,
    )
    .await
}

/// Stricter rate limiting for login and registration endpoints.
/// Limits requests to RATE_LIMIT_AUTH_REQUESTS per RATE_LIMIT_AUTH_WINDOW_SECONDS.
pub async fn rate_limit_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RateLimitError> {
    enforce(
        &state,
        request,
        next,
        "auth",
        RATE_LIMIT_AUTH_REQUESTS,
        RATE_LIMIT_AUTH_WINDOW_SECONDS,
    )
    .await
}
