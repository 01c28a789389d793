//! Project entity.

use sea_orm::entity::prelude::*;
use sea_orm::Set;

use crate::domain::{Priority, Project, ProjectStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub company_id: Uuid,
    pub created_by: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub status: String,
    pub priority: String,
    pub start_date: Option<Date>,
    pub end_date: Option<Date>,
    pub expected_completion_date: Option<Date>,
    pub total_budget: i64,
    pub client_name: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub progress_percentage: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Project {
    fn from(model: Model) -> Self {
        Project {
            id: model.id,
            company_id: model.company_id,
            created_by: model.created_by,
            name: model.name,
            description: model.description,
            location: model.location,
            status: ProjectStatus::from_db(&model.status),
            priority: Priority::from_db(&model.priority),
            start_date: model.start_date,
            end_date: model.end_date,
            expected_completion_date: model.expected_completion_date,
            total_budget: model.total_budget,
            client_name: model.client_name,
            client_email: model.client_email,
            client_phone: model.client_phone,
            progress_percentage: model.progress_percentage,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl From<&Project> for ActiveModel {
    fn from(project: &Project) -> Self {
        ActiveModel {
            id: Set(project.id),
            company_id: Set(project.company_id),
            created_by: Set(project.created_by),
            name: Set(project.name.clone()),
            description: Set(project.description.clone()),
            location: Set(project.location.clone()),
            status: Set(project.status.to_string()),
            priority: Set(project.priority.to_string()),
            start_date: Set(project.start_date),
            end_date: Set(project.end_date),
            expected_completion_date: Set(project.expected_completion_date),
            total_budget: Set(project.total_budget),
            client_name: Set(project.client_name.clone()),
            client_email: Set(project.client_email.clone()),
            client_phone: Set(project.client_phone.clone()),
            progress_percentage: Set(project.progress_percentage),
            created_at: Set(project.created_at),
            updated_at: Set(project.updated_at),
        }
    }
}
