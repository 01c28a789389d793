//! Project service - Company-scoped projects and contractor assignments.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use super::container::parallel;
use crate::domain::{
    Action, AssignmentInput, ContractorAssignment, Project, ProjectFinancials, ProjectInput,
    Resource, TenantContext,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::cache::dashboard_key;
use crate::infra::{CacheStore, UnitOfWork};
use crate::types::{Paginated, PaginationParams, ProjectFilter};

/// A project with its figures and assignments
#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    pub financials: ProjectFinancials,
    pub days_remaining: Option<i64>,
    pub is_overdue: bool,
    pub contractors: Vec<ContractorAssignment>,
}

#[async_trait]
pub trait ProjectService: Send + Sync {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Project>>;

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ProjectDetail>;

    async fn create(&self, ctx: &TenantContext, input: ProjectInput) -> AppResult<Project>;

    async fn update(&self, ctx: &TenantContext, id: Uuid, input: ProjectInput)
        -> AppResult<Project>;

    /// Delete a project together with its expenses
    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()>;

    async fn assign_contractor(
        &self,
        ctx: &TenantContext,
        project_id: Uuid,
        input: AssignmentInput,
    ) -> AppResult<ContractorAssignment>;

    async fn remove_contractor(
        &self,
        ctx: &TenantContext,
        project_id: Uuid,
        assignment_id: Uuid,
    ) -> AppResult<()>;
}

/// Drop the cached dashboard after a write. Failures only log.
pub(crate) async fn invalidate_dashboard(cache: &dyn CacheStore, company_id: Uuid) {
    if let Err(e) = cache.delete(&dashboard_key(company_id)).await {
        tracing::warn!(company_id = %company_id, error = %e, "Failed to invalidate dashboard cache");
    }
}

pub struct ProjectManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
}

impl<U: UnitOfWork> ProjectManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>) -> Self {
        Self { uow, cache }
    }

    async fn load(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Project> {
        self.uow
            .projects()
            .find(ctx.company_id(), id)
            .await?
            .ok_or_not_found()
    }

    async fn ensure_unique_name(
        &self,
        ctx: &TenantContext,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        if self
            .uow
            .projects()
            .name_taken(ctx.company_id(), name.trim(), exclude)
            .await?
        {
            return Err(AppError::conflict("A project with this name"));
        }
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> ProjectService for ProjectManager<U> {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: ProjectFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Project>> {
        ctx.require(Resource::Projects, Action::View)?;
        let page = self
            .uow
            .projects()
            .list(ctx.company_id(), &filter, &params)
            .await?;
        Ok(Paginated::from_page(page, &params))
    }

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ProjectDetail> {
        ctx.require(Resource::Projects, Action::View)?;
        let project = self.load(ctx, id).await?;

        let projects = self.uow.projects();
        let expenses = self.uow.expenses();
        let (expenses, contractors) = parallel::join2(
            expenses.list_for_project(project.id),
            projects.list_assignments(project.id),
        )
        .await?;

        let today = Utc::now().date_naive();
        Ok(ProjectDetail {
            financials: ProjectFinancials::compute(project.total_budget, &expenses),
            days_remaining: project.days_remaining(today),
            is_overdue: project.is_overdue(today),
            contractors,
            project,
        })
    }

    async fn create(&self, ctx: &TenantContext, input: ProjectInput) -> AppResult<Project> {
        ctx.require(Resource::Projects, Action::Create)?;
        self.ensure_unique_name(ctx, &input.name, None).await?;

        let project = Project::new(ctx.company_id(), ctx.user_id, input)?;
        let project = self.uow.projects().create(project).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;

        tracing::info!(company_id = %ctx.company_id(), project_id = %project.id, "Project created");
        Ok(project)
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: ProjectInput,
    ) -> AppResult<Project> {
        ctx.require(Resource::Projects, Action::Edit)?;
        let mut project = self.load(ctx, id).await?;
        self.ensure_unique_name(ctx, &input.name, Some(id)).await?;

        project.apply(input)?;
        let project = self.uow.projects().update(project).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;
        Ok(project)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()> {
        ctx.require(Resource::Projects, Action::Delete)?;
        let project = self.load(ctx, id).await?;

        self.uow.projects().delete(project.id).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;

        tracing::info!(company_id = %ctx.company_id(), project_id = %id, "Project deleted");
        Ok(())
    }

    async fn assign_contractor(
        &self,
        ctx: &TenantContext,
        project_id: Uuid,
        input: AssignmentInput,
    ) -> AppResult<ContractorAssignment> {
        ctx.require(Resource::Projects, Action::Edit)?;
        let project = self.load(ctx, project_id).await?;
        self.uow
            .contractors()
            .find(ctx.company_id(), input.contractor_id)
            .await?
            .ok_or_else(|| AppError::validation("Contractor does not belong to this company"))?;

        let projects = self.uow.projects();
        if projects
            .assignment_exists(project.id, input.contractor_id, input.role.trim())
            .await?
        {
            return Err(AppError::conflict("This contractor assignment"));
        }

        let assignment = ContractorAssignment::new(project.id, input)?;
        projects.create_assignment(assignment).await
    }

    async fn remove_contractor(
        &self,
        ctx: &TenantContext,
        project_id: Uuid,
        assignment_id: Uuid,
    ) -> AppResult<()> {
        ctx.require(Resource::Projects, Action::Edit)?;
        let project = self.load(ctx, project_id).await?;
        self.uow
            .projects()
            .delete_assignment(project.id, assignment_id)
            .await
    }
}
