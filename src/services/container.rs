//! Service Container - Centralized service access with parallel execution support.
//!
//! Handlers reach every use case through [`ServiceContainer`]; [`Services`]
//! wires the concrete managers over one shared [`Persistence`].

use std::future::Future;
use std::sync::Arc;

use super::notifications::Notifier;
use super::{
    AuthService, Authenticator, ContractorManager, ContractorService, DashboardManager,
    DashboardService, DocumentManager, DocumentService, ExpenseManager, ExpenseService,
    NotificationCenter, NotificationService, ProjectManager, ProjectService, RegistrationManager, RegistrationService, SuperOwnerConsole,
    SuperOwnerService, TenancyService, TenantManager,
};
use crate::config::Config;
use crate::errors::AppResult;
use crate::infra::{CacheStore, DocumentStorage, Persistence};
use crate::jobs::Mailer;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
///
/// Provides centralized access to all application services.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn registrations(&self) -> Arc<dyn RegistrationService>;

    fn documents(&self) -> Arc<dyn DocumentService>;

    fn super_owner(&self) -> Arc<dyn SuperOwnerService>;

    fn tenancy(&self) -> Arc<dyn TenancyService>;

    fn projects(&self) -> Arc<dyn ProjectService>;

    fn expenses(&self) -> Arc<dyn ExpenseService>;

    fn contractors(&self) -> Arc<dyn ContractorService>;

    fn dashboard(&self) -> Arc<dyn DashboardService>;

    fn notifications(&self) -> Arc<dyn NotificationService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth: Arc<dyn AuthService>,
    registrations: Arc<dyn RegistrationService>,
    documents: Arc<dyn DocumentService>,
    super_owner: Arc<dyn SuperOwnerService>,
    tenancy: Arc<dyn TenancyService>,
    projects: Arc<dyn ProjectService>,
    expenses: Arc<dyn ExpenseService>,
    contractors: Arc<dyn ContractorService>,
    dashboard: Arc<dyn DashboardService>,
    notifications: Arc<dyn NotificationService>,
}

impl Services {
    /// Wire every service over one database connection
    pub fn from_connection(
        db: sea_orm::DatabaseConnection,
        cache: Arc<dyn CacheStore>,
        mailer: Arc<dyn Mailer>,
        storage: Arc<dyn DocumentStorage>,
        config: Config,
    ) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let notifier = Notifier::new(mailer, config.default_from_email.clone());

        Self {
            auth: Arc::new(Authenticator::new(uow.clone(), cache.clone(), config.clone())),
            registrations: Arc::new(RegistrationManager::new(
                uow.clone(),
                cache.clone(),
                notifier.clone(),
                config.clone(),
            )),
            documents: Arc::new(DocumentManager::new(uow.clone(), storage)),
            super_owner: Arc::new(SuperOwnerConsole::new(uow.clone())),
            tenancy: Arc::new(TenantManager::new(uow.clone(), notifier.clone(), config)),
            projects: Arc::new(ProjectManager::new(uow.clone(), cache.clone())),
            expenses: Arc::new(ExpenseManager::new(
                uow.clone(),
                cache.clone(),
                notifier.clone(),
            )),
            contractors: Arc::new(ContractorManager::new(uow.clone())),
            dashboard: Arc::new(DashboardManager::new(uow.clone(), cache)),
            notifications: Arc::new(NotificationCenter::new(uow, notifier)),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationService> {
        self.registrations.clone()
    }

    fn documents(&self) -> Arc<dyn DocumentService> {
        self.documents.clone()
    }

    fn super_owner(&self) -> Arc<dyn SuperOwnerService> {
        self.super_owner.clone()
    }

    fn tenancy(&self) -> Arc<dyn TenancyService> {
        self.tenancy.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectService> {
        self.projects.clone()
    }

    fn expenses(&self) -> Arc<dyn ExpenseService> {
        self.expenses.clone()
    }

    fn contractors(&self) -> Arc<dyn ContractorService> {
        self.contractors.clone()
    }

    fn dashboard(&self) -> Arc<dyn DashboardService> {
        self.dashboard.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationService> {
        self.notifications.clone()
    }
}

/// Parallel execution utilities for running independent operations concurrently.
///
/// Each helper polls its futures together on the current task and returns
/// the first error.
pub mod parallel {
    use super::*;
    use tokio::try_join;

    /// Execute two independent async operations in parallel.
    ///
    /// # Example
    /// ```ignore
    /// let (expenses, contractors) = parallel::join2(
    ///     uow.expenses().list_for_project(id),
    ///     uow.projects().list_assignments(id),
    /// ).await?;
    /// ```
    pub async fn join2<F1, F2, T1, T2>(f1: F1, f2: F2) -> AppResult<(T1, T2)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
    {
        try_join!(f1, f2)
    }

    /// Execute three independent async operations in parallel.
    pub async fn join3<F1, F2, F3, T1, T2, T3>(
        f1: F1,
        f2: F2,
        f3: F3,
    ) -> AppResult<(T1, T2, T3)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
    {
        try_join!(f1, f2, f3)
    }

    /// Execute four independent async operations in parallel.
    pub async fn join4<F1, F2, F3, F4, T1, T2, T3, T4>(
        f1: F1,
        f2: F2,
        f3: F3,
        f4: F4,
    ) -> AppResult<(T1, T2, T3, T4)>
    where
        F1: Future<Output = AppResult<T1>>,
        F2: Future<Output = AppResult<T2>>,
        F3: Future<Output = AppResult<T3>>,
        F4: Future<Output = AppResult<T4>>,
    {
        try_join!(f1, f2, f3, f4)
    }
}
