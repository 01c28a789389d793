//! Expense and expense-category persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::base::{fetch_page, iequals, search_any, sum_bigint, update_error};
use super::entities::expense::{self, Entity as ExpenseEntity};
use super::entities::expense_category::{self, Entity as CategoryEntity};
use crate::domain::{Expense, ExpenseCategory};
use crate::errors::{AppError, AppResult};
use crate::types::{search_term, ExpenseFilter, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    async fn list(
        &self,
        company_id: Uuid,
        filter: &ExpenseFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Expense>, u64)>;

    /// Every expense of a company, most recent expense date first
    async fn list_all(&self, company_id: Uuid) -> AppResult<Vec<Expense>>;

    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Expense>>;

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Expense>>;

    async fn create(&self, expense: Expense) -> AppResult<Expense>;

    async fn update(&self, expense: Expense) -> AppResult<Expense>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;

    /// Sum of actual costs, for one company or system-wide
    async fn total_actual(&self, company_id: Option<Uuid>) -> AppResult<i64>;

    async fn count(&self, company_id: Option<Uuid>) -> AppResult<u64>;

    async fn list_categories(&self, company_id: Uuid) -> AppResult<Vec<ExpenseCategory>>;

    async fn find_category(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ExpenseCategory>>;

    async fn category_name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool>;

    async fn create_category(&self, category: ExpenseCategory) -> AppResult<ExpenseCategory>;

    async fn update_category(&self, category: ExpenseCategory) -> AppResult<ExpenseCategory>;

    async fn delete_category(&self, id: Uuid) -> AppResult<()>;
}

pub struct ExpenseStore {
    db: DatabaseConnection,
}

impl ExpenseStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ExpenseRepository for ExpenseStore {
    async fn list(
        &self,
        company_id: Uuid,
        filter: &ExpenseFilter,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Expense>, u64)> {
        let mut query = ExpenseEntity::find()
            .filter(expense::Column::CompanyId.eq(company_id))
            .order_by_desc(expense::Column::ExpenseDate)
            .order_by_desc(expense::Column::CreatedAt);
        if let Some(project_id) = filter.project_id {
            query = query.filter(expense::Column::ProjectId.eq(project_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(expense::Column::Status.eq(status.as_str()));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(expense::Column::CategoryId.eq(category_id));
        }
        if let Some(term) = search_term(&filter.search) {
            query = query.filter(search_any(
                vec![
                    expense::Column::Name,
                    expense::Column::Vendor,
                    expense::Column::InvoiceNumber,
                ],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(Expense::from).collect(), total))
    }

    async fn list_all(&self, company_id: Uuid) -> AppResult<Vec<Expense>> {
        let models = ExpenseEntity::find()
            .filter(expense::Column::CompanyId.eq(company_id))
            .order_by_desc(expense::Column::ExpenseDate)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(models.into_iter().map(Expense::from).collect())
    }

    async fn list_for_project(&self, project_id: Uuid) -> AppResult<Vec<Expense>> {
        let models = ExpenseEntity::find()
            .filter(expense::Column::ProjectId.eq(project_id))
            .order_by_desc(expense::Column::ExpenseDate)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Expense::from).collect())
    }

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Expense>> {
        let result = ExpenseEntity::find_by_id(id)
            .filter(expense::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;
        Ok(result.map(Expense::from))
    }

    async fn create(&self, expense: Expense) -> AppResult<Expense> {
        let model = expense::ActiveModel::from(&expense).insert(&self.db).await?;
        Ok(Expense::from(model))
    }

    async fn update(&self, mut expense: Expense) -> AppResult<Expense> {
        expense.updated_at = Utc::now();
        let model = expense::ActiveModel::from(&expense)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Expense::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ExpenseEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn total_actual(&self, company_id: Option<Uuid>) -> AppResult<i64> {
        let mut query = ExpenseEntity::find()
            .select_only()
            .column_as(sum_bigint("actual_cost"), "total");
        if let Some(company_id) = company_id {
            query = query.filter(expense::Column::CompanyId.eq(company_id));
        }
        let total: Option<i64> = query.into_tuple().one(&self.db).await?;
        Ok(total.unwrap_or(0))
    }

    async fn count(&self, company_id: Option<Uuid>) -> AppResult<u64> {
        let mut query = ExpenseEntity::find();
        if let Some(company_id) = company_id {
            query = query.filter(expense::Column::CompanyId.eq(company_id));
        }
        Ok(query.count(&self.db).await?)
    }

    async fn list_categories(&self, company_id: Uuid) -> AppResult<Vec<ExpenseCategory>> {
        let models = CategoryEntity::find()
            .filter(expense_category::Column::CompanyId.eq(company_id))
            .order_by_asc(expense_category::Column::Name)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(ExpenseCategory::from).collect())
    }

    async fn find_category(
        &self,
        company_id: Uuid,
        id: Uuid,
    ) -> AppResult<Option<ExpenseCategory>> {
        let result = CategoryEntity::find_by_id(id)
            .filter(expense_category::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await?;
        Ok(result.map(ExpenseCategory::from))
    }

    async fn category_name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut query = CategoryEntity::find()
            .filter(expense_category::Column::CompanyId.eq(company_id))
            .filter(iequals(expense_category::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(expense_category::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn create_category(&self, category: ExpenseCategory) -> AppResult<ExpenseCategory> {
        let model = expense_category::ActiveModel::from(&category)
            .insert(&self.db)
            .await?;
        Ok(ExpenseCategory::from(model))
    }

    async fn update_category(&self, category: ExpenseCategory) -> AppResult<ExpenseCategory> {
        let model = expense_category::ActiveModel::from(&category)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(ExpenseCategory::from(model))
    }

    async fn delete_category(&self, id: Uuid) -> AppResult<()> {
        let result = CategoryEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
