//! Super owner entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{DelegationLevel, SuperOwner, SuperOwnerFlags};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "super_owners")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub user_id: Uuid,
    pub is_primary_owner: bool,
    pub delegation_level: String,
    pub can_manage_companies: bool,
    pub can_manage_users: bool,
    pub can_activate_accounts: bool,
    pub can_access_admin: bool,
    pub can_delegate_permissions: bool,
    pub can_manage_billing: bool,
    pub can_view_system_analytics: bool,
    /// JSON array of company ids; empty means every company
    pub allowed_company_ids: Json,
    pub created_by: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for SuperOwner {
    fn from(model: Model) -> Self {
        let mut owner = SuperOwner {
            id: model.id,
            user_id: model.user_id,
            is_primary_owner: model.is_primary_owner,
            delegation_level: DelegationLevel::from_db(&model.delegation_level),
            flags: SuperOwnerFlags {
                can_manage_companies: model.can_manage_companies,
                can_manage_users: model.can_manage_users,
                can_activate_accounts: model.can_activate_accounts,
                can_access_admin: model.can_access_admin,
                can_delegate_permissions: model.can_delegate_permissions,
                can_manage_billing: model.can_manage_billing,
                can_view_system_analytics: model.can_view_system_analytics,
            },
            allowed_company_ids: serde_json::from_value(model.allowed_company_ids)
                .unwrap_or_default(),
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        };
        owner.normalize();
        owner
    }
}

impl From<&SuperOwner> for ActiveModel {
    fn from(owner: &SuperOwner) -> Self {
        ActiveModel {
            id: Set(owner.id),
            user_id: Set(owner.user_id),
            is_primary_owner: Set(owner.is_primary_owner),
            delegation_level: Set(owner.delegation_level.to_string()),
            can_manage_companies: Set(owner.flags.can_manage_companies),
            can_manage_users: Set(owner.flags.can_manage_users),
            can_activate_accounts: Set(owner.flags.can_activate_accounts),
            can_access_admin: Set(owner.flags.can_access_admin),
            can_delegate_permissions: Set(owner.flags.can_delegate_permissions),
            can_manage_billing: Set(owner.flags.can_manage_billing),
            can_view_system_analytics: Set(owner.flags.can_view_system_analytics),
            allowed_company_ids: Set(serde_json::json!(owner.allowed_company_ids)),
            created_by: Set(owner.created_by),
            created_at: Set(owner.created_at),
            updated_at: Set(owner.updated_at),
        }
    }
}
