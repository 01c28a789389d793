//! Contractor persistence.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use super::base::{fetch_page, iequals, search_any, update_error};
use super::entities::contractor::{self, Entity as ContractorEntity};
use crate::domain::Contractor;
use crate::errors::{AppError, AppResult};
use crate::types::{search_term, PaginationParams};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait ContractorRepository: Send + Sync {
    async fn list(
        &self,
        company_id: Uuid,
        search: Option<String>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Contractor>, u64)>;

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Contractor>>;

    async fn name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool>;

    async fn create(&self, contractor: Contractor) -> AppResult<Contractor>;

    async fn update(&self, contractor: Contractor) -> AppResult<Contractor>;

    async fn delete(&self, id: Uuid) -> AppResult<()>;
}

pub struct ContractorStore {
    db: DatabaseConnection,
}

impl ContractorStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContractorRepository for ContractorStore {
    async fn list(
        &self,
        company_id: Uuid,
        search: Option<String>,
        params: &PaginationParams,
    ) -> AppResult<(Vec<Contractor>, u64)> {
        let mut query = ContractorEntity::find()
            .filter(contractor::Column::CompanyId.eq(company_id))
            .order_by_asc(contractor::Column::Name);
        if let Some(term) = search_term(&search) {
            query = query.filter(search_any(
                vec![
                    contractor::Column::Name,
                    contractor::Column::ContactPerson,
                    contractor::Column::Email,
                ],
                term,
            ));
        }

        let (models, total) = fetch_page(&self.db, query, params).await?;
        Ok((models.into_iter().map(Contractor::from).collect(), total))
    }

    async fn find(&self, company_id: Uuid, id: Uuid) -> AppResult<Option<Contractor>> {
        let result = ContractorEntity::find_by_id(id)
            .filter(contractor::Column::CompanyId.eq(company_id))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;
        Ok(result.map(Contractor::from))
    }

    async fn name_taken(
        &self,
        company_id: Uuid,
        name: &str,
        exclude: Option<Uuid>,
    ) -> AppResult<bool> {
        let mut query = ContractorEntity::find()
            .filter(contractor::Column::CompanyId.eq(company_id))
            .filter(iequals(contractor::Column::Name, name));
        if let Some(id) = exclude {
            query = query.filter(contractor::Column::Id.ne(id));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    async fn create(&self, contractor: Contractor) -> AppResult<Contractor> {
        let model = contractor::ActiveModel::from(&contractor)
            .insert(&self.db)
            .await?;
        Ok(Contractor::from(model))
    }

    async fn update(&self, mut contractor: Contractor) -> AppResult<Contractor> {
        contractor.updated_at = Utc::now();
        let model = contractor::ActiveModel::from(&contractor)
            .update(&self.db)
            .await
            .map_err(update_error)?;
        Ok(Contractor::from(model))
    }

    async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = ContractorEntity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }
}
