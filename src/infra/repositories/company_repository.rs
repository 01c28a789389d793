//! Company persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::base::{fetch_page, search_any, update_error};
use super::entities::company::{self, Entity as CompanyEntity};
use crate::domain::Company;
use crate::errors::{AppError, AppResult};
use crate::types::{search_term, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Company>>;

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Company>>;

    /// Page of companies; `scope` restricts the result to the given ids
    async fn list(
        &self,
        search: Option<String>,
        scope: Option<Vec<Uuid>>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Company>, u64)>;

    /// Every company in `scope` (all when `None`), newest first
    async fn all(&self, scope: Option<Vec<Uuid>>) -> AppResult<Vec<Company>>;

    async fn update(&self, company: Company) -> AppResult<Company>;

    async fn count(&self, active_only: bool) -> AppResult<u64>;
}

pub struct CompanyStore {
    db: DatabaseConnection,
}

impl CompanyStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CompanyRepository for CompanyStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Company>> {
        let result = CompanyEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Company::from))
    }

    async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<Company>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = CompanyEntity::find()
            .filter(company::Column::Id.is_in(ids))
            .order_by_asc(company::Column::Name)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(Company::from).collect())
    }

    async fn list(
        &self,
        search: Option<String>,
        scope: Option<Vec<Uuid>>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Company>, u64)> {
        let mut query = CompanyEntity::find().order_by_desc(company::Column::CreatedAt);
        if let Some(ids) = scope {
            query = query.filter(company::Column::Id.is_in(ids));
        }
        if let Some(term) = search_term(&search) {
            query = query.filter(search_any(
                vec![company::Column::Name, company::Column::Email, company::Column::Slug],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(Company::from).collect(), total))
    }

    async fn all(&self, scope: Option<Vec<Uuid>>) -> AppResult<Vec<Company>> {
        let mut query = CompanyEntity::find().order_by_desc(company::Column::CreatedAt);
        if let Some(ids) = scope {
            query = query.filter(company::Column::Id.is_in(ids));
        }
        let models = query.all(&self.db).await?;
        Ok(models.into_iter().map(Company::from).collect())
    }

    async fn update(&self, mut company: Company) -> AppResult<Company> {
        company.updated_at = Utc::now();
        let model = company::ActiveModel::from(&company)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Company::from(model))
    }

    async fn count(&self, active_only: bool) -> AppResult<u64> {
        let mut query = CompanyEntity::find();
        if active_only {
            query = query.filter(company::Column::IsActive.eq(true));
        }
        Ok(query.count(&self.db).await?)
    }
}
