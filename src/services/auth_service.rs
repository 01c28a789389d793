//! Authentication service - Handles login, sessions and the caller's own account.
//!
//! Tokens are HS256 JWTs carrying a `jti`; logging out records the `jti`
//! in the cache until the token would have expired anyway.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{Config, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::{Password, SuperOwner, User, UserProfile, UserResponse};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::cache::revoked_token_key;
use crate::infra::{CacheStore, UnitOfWork};

/// Real Argon2 hash verified when the account does not exist, so both
/// failure paths cost the same.
static DUMMY_HASH: Lazy<String> = Lazy::new(|| {
    Password::new("timing-equalizer-password")
        .map(Password::into_string)
        .unwrap_or_default()
});

/// JWT claims payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    /// Whether the user held a super-owner record at login
    pub super_owner: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 86400)]
    pub expires_in: i64,
    pub user: UserResponse,
    pub is_super_owner: bool,
}

/// The caller's account as shown by `/auth/me`
#[derive(Debug, Serialize, ToSchema)]
pub struct ProfileResponse {
    pub user: UserResponse,
    pub profile: Option<UserProfile>,
    pub super_owner: Option<SuperOwner>,
}

/// Editable fields of the caller's own account
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 150, message = "First name must be 1-150 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 150, message = "Last name must be 1-150 characters"))]
    pub last_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Login with username or email and return a JWT
    async fn login(&self, identifier: String, password: String) -> AppResult<TokenResponse>;

    /// Revoke the presented token
    async fn logout(&self, claims: &Claims) -> AppResult<()>;

    /// Verify signature, expiry, revocation and that the account is still active
    async fn verify_token(&self, token: &str) -> AppResult<Claims>;

    async fn profile(&self, user_id: Uuid) -> AppResult<ProfileResponse>;

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate)
        -> AppResult<ProfileResponse>;

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()>;
}

/// Generate JWT token for a user
fn generate_token(user: &User, super_owner: bool, config: &Config) -> AppResult<TokenResponse> {
    let now = Utc::now();
    let expires_at = now + Duration::hours(config.jwt_expiration_hours);

    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        super_owner,
        jti: Uuid::new_v4().to_string(),
        exp: expires_at.timestamp(),
        iat: now.timestamp(),
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret_bytes()),
    )?;

    Ok(TokenResponse {
        access_token: token,
        token_type: TOKEN_TYPE_BEARER.to_string(),
        expires_in: config.jwt_expiration_hours * SECONDS_PER_HOUR,
        user: UserResponse::from(user.clone()),
        is_super_owner: super_owner,
    })
}

/// Decode and check signature and expiry
fn decode_token(token: &str, config: &Config) -> AppResult<Claims> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret_bytes()),
        &Validation::default(),
    )?;

    Ok(token_data.claims)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Concrete implementation of AuthService using Unit of Work.
pub struct Authenticator<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
    config: Config,
}

impl<U: UnitOfWork> Authenticator<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>, config: Config) -> Self {
        Self { uow, cache, config }
    }
}

#[async_trait]
impl<U: UnitOfWork> AuthService for Authenticator<U> {
    async fn login(&self, identifier: String, password: String) -> AppResult<TokenResponse> {
        let user = self.uow.users().find_by_login(&identifier).await?;

        // Verify even when the user is unknown so timing does not reveal it
        let hash = match &user {
            Some(user) => user.password_hash.clone(),
            None => DUMMY_HASH.clone(),
        };
        let password_valid = Password::from_hash(hash).verify(&password);

        let user = match user {
            Some(user) if password_valid => user,
            _ => {
                tracing::warn!(identifier = %identifier, "Failed login attempt");
                return Err(AppError::InvalidCredentials);
            }
        };

        let profile = self.uow.users().find_profile(user.id).await?;
        if !user.can_authenticate(profile.as_ref()) {
            tracing::warn!(user_id = %user.id, "Login refused for inactive account");
            return Err(AppError::AccountInactive);
        }

        self.uow.users().record_login(user.id, Utc::now()).await?;
        let is_super_owner = self.uow.super_owners().find_by_user(user.id).await?.is_some();

        tracing::info!(user_id = %user.id, super_owner = is_super_owner, "User logged in");
        generate_token(&user, is_super_owner, &self.config)
    }

    async fn logout(&self, claims: &Claims) -> AppResult<()> {
        let remaining = claims.exp - Utc::now().timestamp();
        if remaining > 0 {
            self.cache
                .set(&revoked_token_key(&claims.jti), "1".to_string(), remaining as u64)
                .await?;
        }
        tracing::info!(user_id = %claims.sub, "User logged out");
        Ok(())
    }

    async fn verify_token(&self, token: &str) -> AppResult<Claims> {
        let claims = decode_token(token, &self.config)?;
        if self.cache.exists(&revoked_token_key(&claims.jti)).await? {
            return Err(AppError::Unauthorized);
        }

        // Deactivation takes effect on the next request, not at token expiry
        let active = self
            .uow
            .users()
            .find_by_id(claims.sub)
            .await?
            .is_some_and(|user| user.is_active);
        if !active {
            tracing::warn!(user_id = %claims.sub, "Token presented for inactive account");
            return Err(AppError::Unauthorized);
        }
        Ok(claims)
    }

    async fn profile(&self, user_id: Uuid) -> AppResult<ProfileResponse> {
        let user = self.uow.users().find_by_id(user_id).await?.ok_or_not_found()?;
        let profile = self.uow.users().find_profile(user_id).await?;
        let super_owner = self.uow.super_owners().find_by_user(user_id).await?;

        Ok(ProfileResponse {
            user: UserResponse::from(user),
            profile,
            super_owner,
        })
    }

    async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> AppResult<ProfileResponse> {
        let users = self.uow.users();
        let mut user = users.find_by_id(user_id).await?.ok_or_not_found()?;

        if let Some(email) = non_empty(update.email) {
            let email = email.to_lowercase();
            if email != user.email {
                if let Some(other) = users.find_by_email(&email).await? {
                    if other.id != user.id {
                        return Err(AppError::conflict("A user with this email"));
                    }
                }
                user.email = email;
            }
        }
        if let Some(first_name) = non_empty(update.first_name) {
            user.first_name = first_name;
        }
        if let Some(last_name) = non_empty(update.last_name) {
            user.last_name = last_name;
        }
        let user = users.update(user).await?;

        let profile = match users.find_profile(user_id).await? {
            Some(mut profile) if update.phone.is_some() || update.address.is_some() => {
                if update.phone.is_some() {
                    profile.phone = non_empty(update.phone);
                }
                if update.address.is_some() {
                    profile.address = non_empty(update.address);
                }
                Some(users.save_profile(profile).await?)
            }
            other => other,
        };
        let super_owner = self.uow.super_owners().find_by_user(user_id).await?;

        Ok(ProfileResponse {
            user: UserResponse::from(user),
            profile,
            super_owner,
        })
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: String,
        new_password: String,
    ) -> AppResult<()> {
        let users = self.uow.users();
        let mut user = users.find_by_id(user_id).await?.ok_or_not_found()?;

        if !Password::from_hash(user.password_hash.clone()).verify(&current_password) {
            return Err(AppError::validation("Current password is incorrect"));
        }
        if current_password == new_password {
            return Err(AppError::validation(
                "New password must differ from the current password",
            ));
        }

        user.password_hash = Password::new(&new_password)?.into_string();
        users.update(user).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }
}
