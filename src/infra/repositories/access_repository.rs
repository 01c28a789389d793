//! Roles and company memberships.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::base::{iequals, update_error};
use super::entities::membership::{self, Entity as MembershipEntity};
use super::entities::role::{self, Entity as RoleEntity};
use crate::domain::{Membership, MembershipStatus, Role};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccessRepository: Send + Sync {
    async fn list_roles(&self, company_id: Uuid) -> AppResult<Vec<Role>>;

    async fn find_role(&self, company_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>>;

    async fn role_name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool>;

    async fn create_role(&self, role: Role) -> AppResult<Role>;

    async fn update_role(&self, role: Role) -> AppResult<Role>;

    async fn delete_role(&self, role_id: Uuid) -> AppResult<()>;

    /// Memberships of any status that still point at the role
    async fn count_role_members(&self, role_id: Uuid) -> AppResult<u64>;

    async fn memberships_for_user(&self, user_id: Uuid) -> AppResult<Vec<Membership>>;

    async fn find_membership(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<Membership>>;

    async fn find_membership_by_id(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
    ) -> AppResult<Option<Membership>>;

    async fn list_members(&self, company_id: Uuid) -> AppResult<Vec<Membership>>;

    async fn create_membership(&self, membership: Membership) -> AppResult<Membership>;

    async fn update_membership(&self, membership: Membership) -> AppResult<Membership>;

    async fn count_members(&self, company_id: Uuid, active_only: bool) -> AppResult<u64>;

    /// Membership count per company, companies without members omitted
    async fn member_counts(&self, company_ids: Vec<Uuid>) -> AppResult<Vec<(Uuid, u64)>>;
}

pub struct AccessStore {
    db: DatabaseConnection,
}

impl AccessStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccessRepository for AccessStore {
    async fn list_roles(&self, company_id: Uuid) -> AppResult<Vec<Role>> {
        let models = RoleEntity::find()
            .filter(role::Column::CompanyId.eq(company_id))
            .order_by_desc(role::Column::IsAdmin)
            .order_by_asc(role::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Role::from).collect())
    }

    async fn find_role(&self, company_id: Uuid, role_id: Uuid) -> AppResult<Option<Role>> {
        let result = RoleEntity::find_by_id(role_id)
            .filter(role::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;

        Ok(result.map(Role::from))
    }

    async fn role_name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut query = RoleEntity::find()
            .filter(role::Column::CompanyId.eq(company_id))
            .filter(iequals(role::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(role::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn create_role(&self, role: Role) -> AppResult<Role> {
        let model = role::ActiveModel::from(&role).insert(&self.db).await?;
        Ok(Role::from(model))
    }

    async fn update_role(&self, mut role: Role) -> AppResult<Role> {
        role.updated_at = Utc::now();
        let model = role::ActiveModel::from(&role)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Role::from(model))
    }

    async fn delete_role(&self, role_id: Uuid) -> AppResult<()> {
        let result = RoleEntity::delete_by_id(role_id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count_role_members(&self, role_id: Uuid) -> AppResult<u64> {
        Ok(MembershipEntity::find()
            .filter(membership::Column::RoleId.eq(role_id))
            .count(&self.db)
            .await?)
    }

    async fn memberships_for_user(&self, user_id: Uuid) -> AppResult<Vec<Membership>> {
        let models = MembershipEntity::find()
            .filter(membership::Column::UserId.eq(user_id))
            .order_by_asc(membership::Column::JoinedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Membership::from).collect())
    }

    async fn find_membership(
        &self,
        user_id: Uuid,
        company_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        let result = MembershipEntity::find()
            .filter(membership::Column::UserId.eq(user_id))
            .filter(membership::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;

        Ok(result.map(Membership::from))
    }

    async fn find_membership_by_id(
        &self,
        company_id: Uuid,
        membership_id: Uuid,
    ) -> AppResult<Option<Membership>> {
        let result = MembershipEntity::find_by_id(membership_id)
            .filter(membership::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;

        Ok(result.map(Membership::from))
    }

    async fn list_members(&self, company_id: Uuid) -> AppResult<Vec<Membership>> {
        let models = MembershipEntity::find()
            .filter(membership::Column::CompanyId.eq(company_id))
            .order_by_asc(membership::Column::JoinedAt)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Membership::from).collect())
    }

    async fn create_membership(&self, membership: Membership) -> AppResult<Membership> {
        let model = membership::ActiveModel::from(&membership)
            .insert(&self.db)
            .await?;
        Ok(Membership::from(model))
    }

    async fn update_membership(&self, mut membership: Membership) -> AppResult<Membership> {
        membership.updated_at = Utc::now();
        let model = membership::ActiveModel::from(&membership)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Membership::from(model))
    }

    async fn count_members(&self, company_id: Uuid, active_only: bool) -> AppResult<u64> {
        let mut query =
            MembershipEntity::find().filter(membership::Column::CompanyId.eq(company_id));
        if active_only {
            query = query.filter(membership::Column::Status.eq(MembershipStatus::Active.as_str()));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn member_counts(&self, company_ids: Vec<Uuid>) -> AppResult<Vec<(Uuid, u64)>> {
        if company_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows: Vec<(Uuid, i64)> = MembershipEntity::find()
            .select_only()
            .column(membership::Column::CompanyId)
            .column_as(Expr::cust("COUNT(*)"), "count")
            .filter(membership::Column::CompanyId.is_in(company_ids))
            .group_by(membership::Column::CompanyId)
            .into_tuple()
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u64))
            .collect())
    }
}
