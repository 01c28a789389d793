//! Company membership entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Membership, MembershipStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "company_memberships")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role_id: Uuid,
    pub status: String,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Membership {
    fn from(model: Model) -> Self {
        Membership {
            id: model.id,
            user_id: model.user_id,
            company_id: model.company_id,
            role_id: model.role_id,
            status: MembershipStatus::from_db(&model.status),
            invited_by: model.invited_by,
            joined_at: model.joined_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Membership> for ActiveModel {
    fn from(membership: &Membership) -> Self {
        ActiveModel {
            id: Set(membership.id),
            user_id: Set(membership.user_id),
            company_id: Set(membership.company_id),
            role_id: Set(membership.role_id),
            status: Set(membership.status.to_string()),
            invited_by: Set(membership.invited_by),
            joined_at: Set(membership.joined_at),
            created_at: Set(membership.created_at),
            updated_at: Set(membership.updated_at),
        }
    }
}
