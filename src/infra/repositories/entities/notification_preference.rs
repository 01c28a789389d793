//! Notification preference entity, keyed by user, company and kind.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{NotificationKind, NotificationPreference};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notification_preferences")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub company_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub kind: String,
    pub in_app_enabled: bool,
    pub email_enabled: bool,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for NotificationPreference {
    fn from(model: Model) -> Self {
        NotificationPreference {
            user_id: model.user_id,
            company_id: model.company_id,
            kind: NotificationKind::from_db(&model.kind),
            in_app_enabled: model.in_app_enabled,
            email_enabled: model.email_enabled,
            updated_at: model.updated_at,
        }
    }
}

impl From<&NotificationPreference> for ActiveModel {
    fn from(p: &NotificationPreference) -> Self {
        ActiveModel {
            user_id: Set(p.user_id),
            company_id: Set(p.company_id),
            kind: Set(p.kind.to_string()),
            in_app_enabled: Set(p.in_app_enabled),
            email_enabled: Set(p.email_enabled),
            updated_at: Set(p.updated_at),
        }
    }
}
