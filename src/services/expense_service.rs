//! Expense service - Company-scoped expenses and expense categories.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::notification_service::NotificationCenter;
use super::notifications::Notifier;
use super::project_service::invalidate_dashboard;
use crate::domain::{
    normalize_color, Action, Expense, ExpenseCategory, ExpenseInput, ExpenseStatus, Project,
    Resource, TenantContext,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{CacheStore, UnitOfWork};
use crate::types::{ExpenseFilter, Paginated, PaginationParams};

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CategoryInput {
    #[validate(length(min = 1, max = 100, message = "Category name is required (max 100 characters)"))]
    #[schema(example = "Materials")]
    pub name: String,
    pub description: Option<String>,
    /// `#rrggbb`
    #[schema(example = "#3498db")]
    pub color: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct MarkPaidRequest {
    /// Defaults to today
    pub paid_date: Option<NaiveDate>,
}

/// Expense with its derived cost figures
#[derive(Debug, Serialize, ToSchema)]
pub struct ExpenseView {
    #[serde(flatten)]
    pub expense: Expense,
    pub cost_variance: i64,
    pub is_over_budget: bool,
    pub total_cost_with_tax: i64,
}

impl From<Expense> for ExpenseView {
    fn from(expense: Expense) -> Self {
        Self {
            cost_variance: expense.cost_variance(),
            is_over_budget: expense.is_over_budget(),
            total_cost_with_tax: expense.total_cost_with_tax(),
            expense,
        }
    }
}

fn is_settled(status: ExpenseStatus) -> bool {
    matches!(status, ExpenseStatus::Approved | ExpenseStatus::Paid)
}

#[async_trait]
pub trait ExpenseService: Send + Sync {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: ExpenseFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<ExpenseView>>;

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ExpenseView>;

    async fn create(&self, ctx: &TenantContext, input: ExpenseInput) -> AppResult<ExpenseView>;

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: ExpenseInput,
    ) -> AppResult<ExpenseView>;

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()>;

    async fn approve(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ExpenseView>;

    async fn mark_paid(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        paid_date: Option<NaiveDate>,
    ) -> AppResult<ExpenseView>;

    async fn list_categories(&self, ctx: &TenantContext) -> AppResult<Vec<ExpenseCategory>>;

    async fn create_category(
        &self,
        ctx: &TenantContext,
        input: CategoryInput,
    ) -> AppResult<ExpenseCategory>;

    async fn update_category(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: CategoryInput,
    ) -> AppResult<ExpenseCategory>;

    async fn delete_category(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()>;
}

pub struct ExpenseManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
    alerts: NotificationCenter<U>,
}

impl<U: UnitOfWork> ExpenseManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>, notifier: Notifier) -> Self {
        Self {
            alerts: NotificationCenter::new(uow.clone(), notifier),
            uow,
            cache,
        }
    }

    async fn load(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Expense> {
        self.uow
            .expenses()
            .find(ctx.company_id(), id)
            .await?
            .ok_or_not_found()
    }

    /// Project, category and contractor must all belong to the caller's company
    async fn check_references(
        &self,
        ctx: &TenantContext,
        input: &ExpenseInput,
    ) -> AppResult<Project> {
        let company_id = ctx.company_id();
        let project = self
            .uow
            .projects()
            .find(company_id, input.project_id)
            .await?
            .ok_or_else(|| AppError::validation("Project does not belong to this company"))?;

        if let Some(category_id) = input.category_id {
            self.uow
                .expenses()
                .find_category(company_id, category_id)
                .await?
                .ok_or_else(|| AppError::validation("Category does not belong to this company"))?;
        }
        if let Some(contractor_id) = input.contractor_id {
            self.uow
                .contractors()
                .find(company_id, contractor_id)
                .await?
                .ok_or_else(|| {
                    AppError::validation("Contractor does not belong to this company")
                })?;
        }
        Ok(project)
    }

    /// Moving into or out of `approved`/`paid` needs `expenses:approve`.
    fn apply_status(
        ctx: &TenantContext,
        expense: &mut Expense,
        status: Option<ExpenseStatus>,
    ) -> AppResult<()> {
        let Some(status) = status else {
            return Ok(());
        };
        if status == expense.status {
            return Ok(());
        }
        if is_settled(status) || is_settled(expense.status) {
            ctx.require(Resource::Expenses, Action::Approve)?;
        }
        expense.change_status(status, ctx.user_id, Utc::now().date_naive())
    }

    async fn load_category(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ExpenseCategory> {
        self.uow
            .expenses()
            .find_category(ctx.company_id(), id)
            .await?
            .ok_or_not_found()
    }

    async fn ensure_unique_category(
        &self,
        ctx: &TenantContext,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<()> {
        if self
            .uow
            .expenses()
            .category_name_taken(ctx.company_id(), name.trim(), exclude)
            .await?
        {
            return Err(AppError::conflict("A category with this name"));
        }
        Ok(())
    }

    async fn save(&self, ctx: &TenantContext, expense: Expense) -> AppResult<ExpenseView> {
        let expense = self.uow.expenses().update(expense).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;
        Ok(ExpenseView::from(expense))
    }
}

#[async_trait]
impl<U: UnitOfWork> ExpenseService for ExpenseManager<U> {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: ExpenseFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<ExpenseView>> {
        ctx.require(Resource::Expenses, Action::View)?;
        let page = self
            .uow
            .expenses()
            .list(ctx.company_id(), &filter, &params)
            .await?;
        Ok(Paginated::from_page(page, &params).map(ExpenseView::from))
    }

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ExpenseView> {
        ctx.require(Resource::Expenses, Action::View)?;
        self.load(ctx, id).await.map(ExpenseView::from)
    }

    async fn create(&self, ctx: &TenantContext, input: ExpenseInput) -> AppResult<ExpenseView> {
        ctx.require(Resource::Expenses, Action::Create)?;
        input.check_amounts()?;
        let project = self.check_references(ctx, &input).await?;

        let status = input.status;
        let mut expense =
            Expense::new(ctx.company_id(), ctx.user_id, input, Utc::now().date_naive());
        Self::apply_status(ctx, &mut expense, status)?;
        let expense = self.uow.expenses().create(expense).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;

        tracing::info!(
            company_id = %ctx.company_id(),
            expense_id = %expense.id,
            project_id = %expense.project_id,
            actual_cost = expense.actual_cost,
            "Expense created"
        );
        self.alerts.expense_created(ctx, &expense, &project).await;
        if expense.status == ExpenseStatus::Approved {
            self.alerts.expense_approved(ctx, &expense).await;
        }
        self.alerts
            .spending_increased(ctx, &project, expense.actual_cost)
            .await;
        Ok(ExpenseView::from(expense))
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: ExpenseInput,
    ) -> AppResult<ExpenseView> {
        ctx.require(Resource::Expenses, Action::Edit)?;
        input.check_amounts()?;
        let mut expense = self.load(ctx, id).await?;
        let project = self.check_references(ctx, &input).await?;
        let previous_cost = expense.actual_cost;
        let was_approved = expense.status == ExpenseStatus::Approved;

        let status = input.status;
        expense.apply(input);
        Self::apply_status(ctx, &mut expense, status)?;
        let view = self.save(ctx, expense).await?;

        if !was_approved && view.expense.status == ExpenseStatus::Approved {
            self.alerts.expense_approved(ctx, &view.expense).await;
        }
        self.alerts
            .spending_increased(ctx, &project, view.expense.actual_cost - previous_cost)
            .await;
        Ok(view)
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()> {
        ctx.require(Resource::Expenses, Action::Delete)?;
        let expense = self.load(ctx, id).await?;

        self.uow.expenses().delete(expense.id).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;
        tracing::info!(company_id = %ctx.company_id(), expense_id = %id, "Expense deleted");
        Ok(())
    }

    async fn approve(&self, ctx: &TenantContext, id: Uuid) -> AppResult<ExpenseView> {
        ctx.require(Resource::Expenses, Action::Approve)?;
        let mut expense = self.load(ctx, id).await?;

        expense.approve(ctx.user_id)?;
        tracing::info!(expense_id = %id, approver = %ctx.user_id, "Expense approved");
        let view = self.save(ctx, expense).await?;
        self.alerts.expense_approved(ctx, &view.expense).await;
        Ok(view)
    }

    async fn mark_paid(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        paid_date: Option<NaiveDate>,
    ) -> AppResult<ExpenseView> {
        ctx.require(Resource::Expenses, Action::Approve)?;
        let mut expense = self.load(ctx, id).await?;

        expense.mark_paid(paid_date.unwrap_or_else(|| Utc::now().date_naive()))?;
        self.save(ctx, expense).await
    }

    async fn list_categories(&self, ctx: &TenantContext) -> AppResult<Vec<ExpenseCategory>> {
        ctx.require(Resource::Expenses, Action::View)?;
        self.uow.expenses().list_categories(ctx.company_id()).await
    }

    async fn create_category(
        &self,
        ctx: &TenantContext,
        input: CategoryInput,
    ) -> AppResult<ExpenseCategory> {
        ctx.require(Resource::Expenses, Action::Create)?;
        self.ensure_unique_category(ctx, &input.name, None).await?;

        let mut category =
            ExpenseCategory::new(ctx.company_id(), input.name, input.description, input.color)?;
        if let Some(is_active) = input.is_active {
            category.is_active = is_active;
        }
        self.uow.expenses().create_category(category).await
    }

    async fn update_category(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: CategoryInput,
    ) -> AppResult<ExpenseCategory> {
        ctx.require(Resource::Expenses, Action::Edit)?;
        let mut category = self.load_category(ctx, id).await?;
        self.ensure_unique_category(ctx, &input.name, Some(id)).await?;

        category.name = input.name.trim().to_string();
        category.description = input.description;
        if input.color.is_some() {
            category.color = normalize_color(input.color)?;
        }
        if let Some(is_active) = input.is_active {
            category.is_active = is_active;
        }
        let category = self.uow.expenses().update_category(category).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;
        Ok(category)
    }

    async fn delete_category(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()> {
        ctx.require(Resource::Expenses, Action::Delete)?;
        let category = self.load_category(ctx, id).await?;

        self.uow.expenses().delete_category(category.id).await?;
        invalidate_dashboard(self.cache.as_ref(), ctx.company_id()).await;
        Ok(())
    }
}
