//! User and profile persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use super::base::{fetch_page, iequals, search_any, update_error};
use super::entities::user::{self, Entity as UserEntity};
use super::entities::user_profile::{self, Entity as ProfileEntity};
use crate::domain::{NewUser, User, UserProfile};
use crate::errors::{AppError, AppResult};
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find by username or email (case-insensitive)
    async fn find_by_login(&self, identifier: &str) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Whether the username or the email is already used
    async fn exists(&self, username: &str, email: &str) -> AppResult<bool>;

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>>;

    async fn create(&self, user: NewUser) -> AppResult<User>;

    async fn update(&self, user: User) -> AppResult<User>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()>;

    /// Page of users matching an optional search term, newest first
    async fn list(
        &self,
        search: Option<String>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<User>, u64)>;

    async fn count(&self, active_only: bool) -> AppResult<u64>;

    /// Every account, newest first
    async fn all(&self) -> AppResult<Vec<User>>;

    async fn all_profiles(&self) -> AppResult<Vec<UserProfile>>;

    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>>;

    /// Insert or replace a profile
    async fn save_profile(&self, profile: UserProfile) -> AppResult<UserProfile>;
}

/// SeaORM-backed user repository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_login(&self, identifier: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(identifier.trim()))
                    .add(iequals(user::Column::Email, identifier)),
            )
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(iequals(user::Column::Email, email))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn exists(&self, username: &str, email: &str) -> AppResult<bool> {
        let count = UserEntity::find()
            .filter(
                Condition::any()
                    .add(iequals(user::Column::Username, username))
                    .add(iequals(user::Column::Email, email)),
            )
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = UserEntity::find()
            .filter(user::Column::Id.is_in(ids))
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn create(&self, user: NewUser) -> AppResult<User> {
        let now = Utc::now();
        let active_model = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(user.password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            is_active: Set(user.is_active),
            is_staff: Set(user.is_staff),
            last_login_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(User::from(model))
    }

    async fn update(&self, mut user: User) -> AppResult<User> {
        user.updated_at = Utc::now();
        let model = user::ActiveModel::from(&user)
            .update(&self.db)
            .await
            .map_err(update_error)?;

        Ok(User::from(model))
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> AppResult<()> {
        let active = user::ActiveModel {
            id: Set(id),
            last_login_at: Set(Some(at)),
            ..Default::default()
        };
        active.update(&self.db).await.map_err(update_error)?;
        Ok(())
    }

    async fn list(
        &self,
        search: Option<String>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<User>, u64)> {
        let mut query = UserEntity::find().order_by_desc(user::Column::CreatedAt);
        if let Some(term) = crate::types::search_term(&search) {
            query = query.filter(search_any(
                vec![
                    user::Column::Username,
                    user::Column::Email,
                    user::Column::FirstName,
                    user::Column::LastName,
                ],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(User::from).collect(), total))
    }

    async fn count(&self, active_only: bool) -> AppResult<u64> {
        let mut query = UserEntity::find();
        if active_only {
            query = query.filter(user::Column::IsActive.eq(true));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn all(&self) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .order_by_desc(user::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(User::from).collect())
    }

    async fn all_profiles(&self) -> AppResult<Vec<UserProfile>> {
        let models = ProfileEntity::find().all(&self.db).await?;
        Ok(models.into_iter().map(UserProfile::from).collect())
    }

    async fn find_profile(&self, user_id: Uuid) -> AppResult<Option<UserProfile>> {
        let result = ProfileEntity::find_by_id(user_id).one(&self.db).await?;
        Ok(result.map(UserProfile::from))
    }

    async fn save_profile(&self, mut profile: UserProfile) -> AppResult<UserProfile> {
        profile.updated_at = Utc::now();
        let exists = ProfileEntity::find_by_id(profile.user_id)
            .one(&self.db)
            .await?
            .is_some();

        let active = user_profile::ActiveModel::from(&profile);
        let model = if exists {
            active.update(&self.db).await.map_err(update_error)?
        } else {
            active.insert(&self.db).await?
        };
        Ok(UserProfile::from(model))
    }
}
