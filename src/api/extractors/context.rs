//! Extractors resolving who the caller acts as.
//!
//! Both need [`CurrentUser`](crate::api::middleware::CurrentUser), so they
//! only work behind the authentication middleware.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::middleware::CurrentUser;
use crate::api::AppState;
use crate::domain::{SuperOwner, TenantContext};
use crate::errors::AppError;

/// The caller's current company, membership and role
pub struct Tenant(pub TenantContext);

#[async_trait]
impl FromRequestParts<AppState> for Tenant {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let ctx = state.services.tenancy().resolve(user.id).await?;
        Ok(Tenant(ctx))
    }
}

/// The caller's super-owner record; forbidden for everyone else
pub struct SuperOwnerActor(pub SuperOwner);

#[async_trait]
impl FromRequestParts<AppState> for SuperOwnerActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        let owner = state
            .services
            .super_owner()
            .require_super_owner(user.id)
            .await?;
        Ok(SuperOwnerActor(owner))
    }
}
