//! Contractor-to-project assignment entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::ContractorAssignment;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "project_contractors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub contractor_id: Uuid,
    pub role: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub hourly_rate: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ContractorAssignment {
    fn from(model: Model) -> Self {
        ContractorAssignment {
            id: model.id,
            project_id: model.project_id,
            contractor_id: model.contractor_id,
            role: model.role,
            start_date: model.start_date,
            end_date: model.end_date,
            hourly_rate: model.hourly_rate,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

impl From<&ContractorAssignment> for ActiveModel {
    fn from(assignment: &ContractorAssignment) -> Self {
        ActiveModel {
            id: Set(assignment.id),
            project_id: Set(assignment.project_id),
            contractor_id: Set(assignment.contractor_id),
            role: Set(assignment.role.clone()),
            start_date: Set(assignment.start_date),
            end_date: Set(assignment.end_date),
            hourly_rate: Set(assignment.hourly_rate),
            is_active: Set(assignment.is_active),
            created_at: Set(assignment.created_at),
        }
    }
}
