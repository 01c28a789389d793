//! Super owner persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::base::update_error;
use super::entities::super_owner::{self, Entity as SuperOwnerEntity};
use crate::domain::SuperOwner;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait SuperOwnerRepository: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<SuperOwner>>;

    async fn find_primary(&self) -> AppResult<Option<SuperOwner>>;

    /// Every super owner, primary first
    async fn list(&self) -> AppResult<Vec<SuperOwner>>;

    async fn create(&self, owner: SuperOwner) -> AppResult<SuperOwner>;

    async fn update(&self, owner: SuperOwner) -> AppResult<SuperOwner>;
}

pub struct SuperOwnerStore {
    db: DatabaseConnection,
}

impl SuperOwnerStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SuperOwnerRepository for SuperOwnerStore {
    async fn find_by_user(&self, user_id: Uuid) -> AppResult<Option<SuperOwner>> {
        let result = SuperOwnerEntity::find()
            .filter(super_owner::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(SuperOwner::from))
    }

    async fn find_primary(&self) -> AppResult<Option<SuperOwner>> {
        let result = SuperOwnerEntity::find()
            .filter(super_owner::Column::IsPrimaryOwner.eq(true))
            .one(&self.db)
            .await?;

        Ok(result.map(SuperOwner::from))
    }

    async fn list(&self) -> AppResult<Vec<SuperOwner>> {
        let models = SuperOwnerEntity::find()
            .order_by_desc(super_owner::Column::IsPrimaryOwner)
            .order_by_asc(super_owner::Column::CreatedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(SuperOwner::from).collect())
    }

    async fn create(&self, mut owner: SuperOwner) -> AppResult<SuperOwner> {
        owner.normalize();
        let model = super_owner::ActiveModel::from(&owner)
            .insert(&self.db)
            .await?;
        Ok(SuperOwner::from(model))
    }

    async fn update(&self, mut owner: SuperOwner) -> AppResult<SuperOwner> {
        owner.normalize();
        owner.updated_at = Utc::now();
        let model = super_owner::ActiveModel::from(&owner)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(SuperOwner::from(model))
    }
}
