//! Company role entity. Permissions are a JSON array of `{resource, action}`.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::Role;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
    pub is_supervisor: bool,
    pub is_team_member: bool,
    pub permissions: Json,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Role {
    fn from(model: Model) -> Self {
        let permissions = serde_json::from_value(model.permissions).unwrap_or_else(|e| {
            tracing::warn!(role_id = %model.id, error = %e, "Unreadable role permissions");
            Vec::new()
        });
        Role {
            id: model.id,
            company_id: model.company_id,
            name: model.name,
            description: model.description,
            is_admin: model.is_admin,
            is_supervisor: model.is_supervisor,
            is_team_member: model.is_team_member,
            permissions,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Role> for ActiveModel {
    fn from(role: &Role) -> Self {
        ActiveModel {
            id: Set(role.id),
            company_id: Set(role.company_id),
            name: Set(role.name.clone()),
            description: Set(role.description.clone()),
            is_admin: Set(role.is_admin),
            is_supervisor: Set(role.is_supervisor),
            is_team_member: Set(role.is_team_member),
            permissions: Set(serde_json::json!(role.permissions)),
            created_at: Set(role.created_at),
            updated_at: Set(role.updated_at),
        }
    }
}
