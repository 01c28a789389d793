//! Project and contractor-assignment persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::base::{fetch_page, iequals, search_any, sum_bigint, update_error};
use super::entities::project::{self, Entity as ProjectEntity};
use super::entities::project_contractor::{self, Entity as AssignmentEntity};
use crate::domain::{ContractorAssignment, Project, ProjectStatus};
use crate::errors::{AppError, AppResult};
use crate::types::{search_term, PaginationParams, ProjectFilter};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    async fn list(
        &self,
        company_id: Uuid,
        filter: &ProjectFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Project>, u64)>;

    /// Every project of a company, newest first
    async fn list_all(&self, company_id: Uuid) -> AppResult<Vec<Project>>;

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Project>>;

    async fn name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool>;

    async fn create(&self, project: Project) -> AppResult<Project>;

    async fn update(&self, project: Project) -> AppResult<Project>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Project count, for one company or system-wide
    async fn count(&self, company_id: Option<Uuid>, active_only: bool) -> AppResult<u64>;

    async fn total_budget(&self, company_id: Uuid) -> AppResult<i64>;

    async fn list_assignments(&self, project_id: Uuid) -> AppResult<Vec<ContractorAssignment>>;

    async fn assignment_exists(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
        role: &str,
    ) -> AppResult<bool>;

    async fn create_assignment(
        &self,
        assignment: ContractorAssignment,
    ) -> AppResult<ContractorAssignment>;

    async fn delete_assignment(&self, project_id: Uuid, assignment_id: Uuid) -> AppResult<()>;
}

pub struct ProjectStore {
    db: DatabaseConnection,
}

impl ProjectStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn active_statuses() -> Vec<&'static str> {
    ProjectStatus::ALL
        .iter()
        .filter(|s| s.is_active())
        .map(|s| s.as_str())
        .collect()
}

#[async_trait]
impl ProjectRepository for ProjectStore {
    async fn list(
        &self,
        company_id: Uuid,
        filter: &ProjectFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Project>, u64)> {
        let mut query = ProjectEntity::find()
            .filter(project::Column::CompanyId.eq(company_id))
            .order_by_desc(project::Column::CreatedAt);
        if let Some(status) = filter.status {
            query = query.filter(project::Column::Status.eq(status.as_str()));
        }
        if let Some(term) = search_term(&filter.search) {
            query = query.filter(search_any(
                vec![
                    project::Column::Name,
                    project::Column::Location,
                    project::Column::ClientName,
                ],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(Project::from).collect(), total))
    }

    async fn list_all(&self, company_id: Uuid) -> AppResult<Vec<Project>> {
        let models = ProjectEntity::find()
            .filter(project::Column::CompanyId.eq(company_id))
            .order_by_desc(project::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(models.into_iter().map(Project::from).collect())
    }

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Project>> {
        let result = ProjectEntity::find_by_id(id)
            .filter(project::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Project::from))
    }

    async fn name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut query = ProjectEntity::find()
            .filter(project::Column::CompanyId.eq(company_id))
            .filter(iequals(project::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(project::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn create(&self, project: Project) -> AppResult<Project> {
        let model = project::ActiveModel::from(&project).insert(&self.db).await?;
        Ok(Project::from(model))
    }

    async fn update(&self, mut project: Project) -> AppResult<Project> {
        project.updated_at = Utc::now();
        let model = project::ActiveModel::from(&project)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Project::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ProjectEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn count(&self, company_id: Option<Uuid>, active_only: bool) -> AppResult<u64> {
        let mut query = ProjectEntity::find();
        if let Some(company_id) = company_id {
            query = query.filter(project::Column::CompanyId.eq(company_id));
        }
        if active_only {
            query = query.filter(project::Column::Status.is_in(active_statuses()));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn total_budget(&self, company_id: Uuid) -> AppResult<i64> {
        let total: Option<i64> = ProjectEntity::find()
            .select_only()
            .column_as(sum_bigint("total_budget"), "total")
            .filter(project::Column::CompanyId.eq(company_id))
            .into_tuple()
            .one(&self.db)
            .await?;
        Ok(total.unwrap_or(0))
    }

    async fn list_assignments(&self, project_id: Uuid) -> AppResult<Vec<ContractorAssignment>> {
        let models = AssignmentEntity::find()
            .filter(project_contractor::Column::ProjectId.eq(project_id))
            .order_by_asc(project_contractor::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(ContractorAssignment::from).collect())
    }

    async fn assignment_exists(
        &self,
        project_id: Uuid,
        contractor_id: Uuid,
        role: &str,
    ) -> AppResult<bool> {
        let count = AssignmentEntity::find()
            .filter(project_contractor::Column::ProjectId.eq(project_id))
            .filter(project_contractor::Column::ContractorId.eq(contractor_id))
            .filter(iequals(project_contractor::Column::Role, role))
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn create_assignment(
        &self,
        assignment: ContractorAssignment,
    ) -> AppResult<ContractorAssignment> {
        let model = project_contractor::ActiveModel::from(&assignment)
            .insert(&self.db)
            .await?;
        Ok(ContractorAssignment::from(model))
    }

    async fn delete_assignment(&self, project_id: Uuid, assignment_id: Uuid) -> AppResult<()> {
        let result = AssignmentEntity::delete_many()
            .filter(project_contractor::Column::Id.eq(assignment_id))
            .filter(project_contractor::Column::ProjectId.eq(project_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
