//! Dashboard service - Per-company summary with a short-lived cache.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

use super::container::parallel;
use crate::config::DASHBOARD_CACHE_TTL_SECONDS;
use crate::domain::{Action, DashboardSummary, Resource, TenantContext};
use crate::errors::AppResult;
use crate::infra::cache::{dashboard_key, read_json, write_json};
use crate::infra::{CacheStore, UnitOfWork};

#[async_trait]
pub trait DashboardService: Send + Sync {
    async fn summary(&self, ctx: &TenantContext) -> AppResult<DashboardSummary>;
}

pub struct DashboardManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
}

impl<U: UnitOfWork> DashboardManager<U> {
    pub fn new(uow: Arc<U>, cache: Arc<dyn CacheStore>) -> Self {
        Self { uow, cache }
    }
}

#[async_trait]
impl<U: UnitOfWork> DashboardService for DashboardManager<U> {
    async fn summary(&self, ctx: &TenantContext) -> AppResult<DashboardSummary> {
        ctx.require(Resource::Projects, Action::View)?;
        let key = dashboard_key(ctx.company_id());

        if let Some(summary) = read_json::<DashboardSummary>(self.cache.as_ref(), &key).await {
            tracing::debug!(company_id = %ctx.company_id(), "Dashboard cache hit");
            return Ok(summary);
        }

        let company_id = ctx.company_id();
        let projects = self.uow.projects();
        let expenses = self.uow.expenses();
        let (projects, expenses, categories) = parallel::join3(
            projects.list_all(company_id),
            expenses.list_all(company_id),
            expenses.list_categories(company_id),
        )
        .await?;

        let summary =
            DashboardSummary::build(&projects, &expenses, &categories, Utc::now().date_naive());
        write_json(self.cache.as_ref(), &key, &summary, DASHBOARD_CACHE_TTL_SECONDS).await;
        Ok(summary)
    }
}
