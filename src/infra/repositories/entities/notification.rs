//! Notification entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Notification, NotificationKind, NotificationPriority};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: String,
    pub priority: String,
    pub title: String,
    pub message: String,
    pub object_id: Option<Uuid>,
    pub read_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Notification {
    fn from(model: Model) -> Self {
        Notification {
            id: model.id,
            company_id: model.company_id,
            recipient_id: model.recipient_id,
            sender_id: model.sender_id,
            kind: NotificationKind::from_db(&model.kind),
            priority: NotificationPriority::from_db(&model.priority),
            title: model.title,
            message: model.message,
            object_id: model.object_id,
            read_at: model.read_at,
            created_at: model.created_at,
        }
    }
}

impl From<&Notification> for ActiveModel {
    fn from(n: &Notification) -> Self {
        ActiveModel {
            id: Set(n.id),
            company_id: Set(n.company_id),
            recipient_id: Set(n.recipient_id),
            sender_id: Set(n.sender_id),
            kind: Set(n.kind.to_string()),
            priority: Set(n.priority.to_string()),
            title: Set(n.title.clone()),
            message: Set(n.message.clone()),
            object_id: Set(n.object_id),
            read_at: Set(n.read_at),
            created_at: Set(n.created_at),
        }
    }
}
