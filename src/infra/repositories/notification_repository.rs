//! Notification and notification preference persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::base::{fetch_page, update_error};
use super::entities::membership::{self, Entity as MembershipEntity};
use super::entities::notification::{self, Entity as NotificationEntity};
use super::entities::notification_preference::{self, Entity as PreferenceEntity};
use super::entities::role::{self, Entity as RoleEntity};
use crate::domain::{
    Audience, MembershipStatus, Notification, NotificationKind, NotificationPreference,
};
use crate::errors::AppResult;
use crate::types::PaginationParams;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a batch, returning how many rows were written
    async fn create_many(&self, notifications: Vec<Notification>) -> AppResult<u64>;

    /// A user's notifications in one company, newest first
    async fn list(
        &self,
        recipient_id: Uuid,
        company_id: Uuid,
        unread_only: bool,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Notification>, u64)>;

    async fn find(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>>;

    async fn update(&self, notification: Notification) -> AppResult<Notification>;

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;

    async fn count_unread(&self, recipient_id: Uuid, company_id: Uuid) -> AppResult<u64>;

    /// User ids of the active members in `audience`
    async fn recipients(&self, company_id: Uuid, audience: Audience) -> AppResult<Vec<Uuid>>;

    /// Stored preferences of `user_ids`, optionally for a single kind
    async fn preferences(
        &self,
        company_id: Uuid,
        user_ids: Vec<Uuid>,
        kind: Option<NotificationKind>,
    ) -> AppResult<Vec<NotificationPreference>>;

    /// Insert or replace a preference
    async fn save_preference(
        &self,
        preference: NotificationPreference,
    ) -> AppResult<NotificationPreference>;
}

pub struct NotificationStore {
    db: DatabaseConnection,
}

impl NotificationStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn unread_for(recipient_id: Uuid, company_id: Uuid) -> Condition {
    Condition::all()
        .add(notification::Column::RecipientId.eq(recipient_id))
        .add(notification::Column::CompanyId.eq(company_id))
        .add(notification::Column::ReadAt.is_null())
}

#[async_trait]
impl NotificationRepository for NotificationStore {
    async fn create_many(&self, notifications: Vec<Notification>) -> AppResult<u64> {
        if notifications.is_empty() {
            return Ok(0);
        }
        let count = notifications.len() as u64;
        NotificationEntity::insert_many(notifications.iter().map(notification::ActiveModel::from))
            .exec(&self.db)
            .await?;
        Ok(count)
    }

    async fn list(
        &self,
        recipient_id: Uuid,
        company_id: Uuid,
        unread_only: bool,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Notification>, u64)> {
        let mut query = NotificationEntity::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::CompanyId.eq(company_id))
            .order_by_desc(notification::Column::CreatedAt);
        if unread_only {
            query = query.filter(notification::Column::ReadAt.is_null());
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(Notification::from).collect(), total))
    }

    async fn find(&self, recipient_id: Uuid, id: Uuid) -> AppResult<Option<Notification>> {
        let result = NotificationEntity::find_by_id(id)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Notification::from))
    }

    async fn update(&self, notification: Notification) -> AppResult<Notification> {
        let model = notification::ActiveModel::from(&notification)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Notification::from(model))
    }

    async fn mark_all_read(
        &self,
        recipient_id: Uuid,
        company_id: Uuid,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = NotificationEntity::update_many()
            .col_expr(notification::Column::ReadAt, Expr::value(at))
            .filter(unread_for(recipient_id, company_id))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    async fn count_unread(&self, recipient_id: Uuid, company_id: Uuid) -> AppResult<u64> {
        Ok(NotificationEntity::find()
            .filter(unread_for(recipient_id, company_id))
            .count(&self.db)
            .await?)
    }

    async fn recipients(&self, company_id: Uuid, audience: Audience) -> AppResult<Vec<Uuid>> {
        let roles = match audience {
            Audience::Supervisors => Condition::all().add(role::Column::IsSupervisor.eq(true)),
            Audience::Managers => Condition::any()
                .add(role::Column::IsSupervisor.eq(true))
                .add(role::Column::IsAdmin.eq(true)),
        };
        let role_ids: Vec<Uuid> = RoleEntity::find()
            .select_only()
            .column(role::Column::Id)
            .filter(role::Column::CompanyId.eq(company_id))
            .filter(roles)
            .into_tuple()
            .all(&self.db)
            .await?;
        if role_ids.is_empty() {
            return Ok(Vec::new());
        }

        let user_ids: Vec<Uuid> = MembershipEntity::find()
            .select_only()
            .column(membership::Column::UserId)
            .filter(membership::Column::CompanyId.eq(company_id))
            .filter(membership::Column::RoleId.is_in(role_ids))
            .filter(membership::Column::Status.eq(MembershipStatus::Active.as_str()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(user_ids)
    }

    async fn preferences(
        &self,
        company_id: Uuid,
        user_ids: Vec<Uuid>,
        kind: Option<NotificationKind>,
    ) -> AppResult<Vec<NotificationPreference>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut query = PreferenceEntity::find()
            .filter(notification_preference::Column::CompanyId.eq(company_id))
            .filter(notification_preference::Column::UserId.is_in(user_ids));
        if let Some(kind) = kind {
            query = query.filter(notification_preference::Column::Kind.eq(kind.as_str()));
        }
        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(NotificationPreference::from).collect())
    }

    async fn save_preference(
        &self,
        preference: NotificationPreference,
    ) -> AppResult<NotificationPreference> {
        PreferenceEntity::insert(notification_preference::ActiveModel::from(&preference))
            .on_conflict(
                OnConflict::columns([
                    notification_preference::Column::UserId,
                    notification_preference::Column::CompanyId,
                    notification_preference::Column::Kind,
                ])
                .update_columns([
                    notification_preference::Column::InAppEnabled,
                    notification_preference::Column::EmailEnabled,
                    notification_preference::Column::UpdatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await?;
        Ok(preference)
    }
}
