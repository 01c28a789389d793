//! Contractor service - Company-scoped contractor directory.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Action, Contractor, ContractorInput, Resource, TenantContext};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams, SearchFilter};

#[async_trait]
pub trait ContractorService: Send + Sync {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: SearchFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Contractor>>;

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Contractor>;

    async fn create(&self, ctx: &TenantContext, input: ContractorInput) -> AppResult<Contractor>;

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: ContractorInput,
    ) -> AppResult<Contractor>;

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()>;
}

pub struct ContractorManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> ContractorManager<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn load(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Contractor> {
        self.uow
            .contractors()
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
            .contractors()
            .name_taken(ctx.company_id(), name.trim(), exclude)
            .await?
        {
            return Err(AppError::conflict("A contractor with this name"));
        }
        Ok(())
    }
}

#[async_trait]
impl<U: UnitOfWork> ContractorService for ContractorManager<U> {
    async fn list(
        &self,
        ctx: &TenantContext,
        filter: SearchFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<Contractor>> {
        ctx.require(Resource::Contractors, Action::View)?;
        let page = self
            .uow
            .contractors()
            .list(ctx.company_id(), filter.search, &params)
            .await?;
        Ok(Paginated::from_page(page, &params))
    }

    async fn get(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Contractor> {
        ctx.require(Resource::Contractors, Action::View)?;
        self.load(ctx, id).await
    }

    async fn create(&self, ctx: &TenantContext, input: ContractorInput) -> AppResult<Contractor> {
        ctx.require(Resource::Contractors, Action::Create)?;
        self.ensure_unique_name(ctx, &input.name, None).await?;

        let contractor = self
            .uow
            .contractors()
            .create(Contractor::new(ctx.company_id(), input))
            .await?;
        tracing::info!(company_id = %ctx.company_id(), contractor_id = %contractor.id, "Contractor created");
        Ok(contractor)
    }

    async fn update(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: ContractorInput,
    ) -> AppResult<Contractor> {
        ctx.require(Resource::Contractors, Action::Edit)?;
        let mut contractor = self.load(ctx, id).await?;
        self.ensure_unique_name(ctx, &input.name, Some(id)).await?;

        contractor.apply(input);
        self.uow.contractors().update(contractor).await
    }

    async fn delete(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()> {
        ctx.require(Resource::Contractors, Action::Delete)?;
        let contractor = self.load(ctx, id).await?;
        self.uow.contractors().delete(contractor.id).await
    }
}
