//! Unit of Work pattern implementation.
//!
//! The Unit of Work:
//! - Centralizes access to all repositories
//! - Manages database transactions (begin, commit, rollback)
//! - Exposes the multi-row provisioning workflows that must be atomic

use sea_orm::{
    AccessMode, ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, IsolationLevel, QueryFilter, QuerySelect, TransactionTrait,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use uuid::Uuid;

use super::provisioning::{AccountProvisioner, ProvisioningStore};
use super::repositories::entities::{
    company, membership, registration_request, role, user, user_profile,
};
use super::repositories::{
    AccessRepository, AccessStore, CompanyRepository, CompanyStore, ContractorRepository,
    ContractorStore, DocumentRepository, DocumentStore, ExpenseRepository, ExpenseStore,
    NotificationRepository, NotificationStore, ProjectRepository, ProjectStore, RegistrationRepository, RegistrationStore,
    SuperOwnerRepository, SuperOwnerStore, UserRepository, UserStore,
};
use crate::domain::{
    Company, Membership, NewCompany, NewUser, RegistrationRequest, Role, User, UserProfile,
};
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories. Services are generic
/// over it so tests can hand in mock repositories.
pub trait UnitOfWork: Send + Sync {
    fn users(&self) -> Arc<dyn UserRepository>;

    fn super_owners(&self) -> Arc<dyn SuperOwnerRepository>;

    fn companies(&self) -> Arc<dyn CompanyRepository>;

    /// Roles and memberships
    fn access(&self) -> Arc<dyn AccessRepository>;

    fn registrations(&self) -> Arc<dyn RegistrationRepository>;

    fn documents(&self) -> Arc<dyn DocumentRepository>;

    fn projects(&self) -> Arc<dyn ProjectRepository>;

    fn expenses(&self) -> Arc<dyn ExpenseRepository>;

    fn contractors(&self) -> Arc<dyn ContractorRepository>;

    /// In-app notifications and delivery preferences
    fn notifications(&self) -> Arc<dyn NotificationRepository>;

    /// Transactional account creation
    fn provisioning(&self) -> Arc<dyn AccountProvisioner>;
}

/// Boxed transactional closure
pub type TransactionFn<'a, T> = Pin<Box<dyn Future<Output = AppResult<T>> + Send + 'a>>;

/// Execute a closure within a ReadCommitted transaction.
///
/// The transaction is committed on success and rolled back on error.
pub async fn run_in_transaction<F, T>(db: &DatabaseConnection, f: F) -> AppResult<T>
where
    F: for<'a> FnOnce(TransactionContext<'a>) -> TransactionFn<'a, T> + Send,
    T: Send,
{
    let txn = db
        .begin_with_config(
            Some(IsolationLevel::ReadCommitted),
            Some(AccessMode::ReadWrite),
        )
        .await
        .map_err(AppError::from)?;

    let ctx = TransactionContext::new(&txn);

    match f(ctx).await {
        Ok(result) => {
            txn.commit().await.map_err(AppError::from)?;
            Ok(result)
        }
        Err(e) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!("Transaction rollback failed: {}", rollback_err);
            }
            Err(e)
        }
    }
}

/// Simpler API for executing transactional operations.
#[macro_export]
macro_rules! with_transaction {
    ($db:expr, |$ctx:ident| $body:expr) => {
        $crate::infra::run_in_transaction($db, |$ctx| Box::pin(async move { $body })).await
    };
}

/// Transaction context providing repository access within a transaction.
///
/// All repository operations performed through this context are part
/// of the same database transaction.
pub struct TransactionContext<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TransactionContext<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }

    pub fn users(&self) -> TxUserRepository<'_> {
        TxUserRepository { txn: self.txn }
    }

    pub fn companies(&self) -> TxCompanyRepository<'_> {
        TxCompanyRepository { txn: self.txn }
    }

    pub fn access(&self) -> TxAccessRepository<'_> {
        TxAccessRepository { txn: self.txn }
    }

    pub fn registrations(&self) -> TxRegistrationRepository<'_> {
        TxRegistrationRepository { txn: self.txn }
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    users: Arc<UserStore>,
    super_owners: Arc<SuperOwnerStore>,
    companies: Arc<CompanyStore>,
    access: Arc<AccessStore>,
    registrations: Arc<RegistrationStore>,
    documents: Arc<DocumentStore>,
    projects: Arc<ProjectStore>,
    expenses: Arc<ExpenseStore>,
    contractors: Arc<ContractorStore>,
    notifications: Arc<NotificationStore>,
    provisioning: Arc<ProvisioningStore>,
}

impl Persistence {
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            super_owners: Arc::new(SuperOwnerStore::new(db.clone())),
            companies: Arc::new(CompanyStore::new(db.clone())),
            access: Arc::new(AccessStore::new(db.clone())),
            registrations: Arc::new(RegistrationStore::new(db.clone())),
            documents: Arc::new(DocumentStore::new(db.clone())),
            projects: Arc::new(ProjectStore::new(db.clone())),
            expenses: Arc::new(ExpenseStore::new(db.clone())),
            contractors: Arc::new(ContractorStore::new(db.clone())),
            notifications: Arc::new(NotificationStore::new(db.clone())),
            provisioning: Arc::new(ProvisioningStore::new(db)),
        }
    }
}

impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn super_owners(&self) -> Arc<dyn SuperOwnerRepository> {
        self.super_owners.clone()
    }

    fn companies(&self) -> Arc<dyn CompanyRepository> {
        self.companies.clone()
    }

    fn access(&self) -> Arc<dyn AccessRepository> {
        self.access.clone()
    }

    fn registrations(&self) -> Arc<dyn RegistrationRepository> {
        self.registrations.clone()
    }

    fn documents(&self) -> Arc<dyn DocumentRepository> {
        self.documents.clone()
    }

    fn projects(&self) -> Arc<dyn ProjectRepository> {
        self.projects.clone()
    }

    fn expenses(&self) -> Arc<dyn ExpenseRepository> {
        self.expenses.clone()
    }

    fn contractors(&self) -> Arc<dyn ContractorRepository> {
        self.contractors.clone()
    }

    fn notifications(&self) -> Arc<dyn NotificationRepository> {
        self.notifications.clone()
    }

    fn provisioning(&self) -> Arc<dyn AccountProvisioner> {
        self.provisioning.clone()
    }
}

// =============================================================================
// Transaction-aware repositories
// =============================================================================

/// Transaction-aware user and profile repository.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    pub async fn create(&self, new_user: NewUser) -> AppResult<User> {
        let user = new_user.into_user();
        let model = user::ActiveModel::from(&user)
            .insert(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(User::from(model))
    }

    pub async fn create_profile(&self, profile: UserProfile) -> AppResult<UserProfile> {
        let model = user_profile::ActiveModel::from(&profile)
            .insert(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(UserProfile::from(model))
    }
}

/// Transaction-aware company repository.
pub struct TxCompanyRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxCompanyRepository<'a> {
    /// Existing slugs equal to `base` or starting with `base-`
    pub async fn slugs_like(&self, base: &str) -> AppResult<Vec<String>> {
        let slugs: Vec<String> = company::Entity::find()
            .select_only()
            .column(company::Column::Slug)
            .filter(
                company::Column::Slug
                    .eq(base)
                    .or(company::Column::Slug.starts_with(format!("{}-", base))),
            )
            .into_tuple()
            .all(self.txn)
            .await?;

        Ok(slugs)
    }

    pub async fn create(&self, new_company: NewCompany) -> AppResult<Company> {
        let company = new_company.into_company();
        let model = company::ActiveModel::from(&company)
            .insert(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(Company::from(model))
    }
}

/// Transaction-aware role and membership repository.
pub struct TxAccessRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxAccessRepository<'a> {
    pub async fn create_role(&self, role: Role) -> AppResult<Role> {
        let model = role::ActiveModel::from(&role).insert(self.txn).await?;
        Ok(Role::from(model))
    }

    pub async fn create_membership(&self, membership: Membership) -> AppResult<Membership> {
        let model = membership::ActiveModel::from(&membership)
            .insert(self.txn)
            .await?;
        Ok(Membership::from(model))
    }
}

/// Transaction-aware registration request repository.
pub struct TxRegistrationRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxRegistrationRepository<'a> {
    /// Load a request and lock its row until the transaction ends.
    pub async fn find_for_update(&self, id: Uuid) -> AppResult<Option<RegistrationRequest>> {
        let result = registration_request::Entity::find_by_id(id)
            .lock_exclusive()
            .one(self.txn)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(RegistrationRequest::from))
    }

    pub async fn update(&self, request: RegistrationRequest) -> AppResult<RegistrationRequest> {
        let model = registration_request::ActiveModel::from(&request)
            .update(self.txn)
            .await
            .map_err(super::repositories::update_error)?;

        Ok(RegistrationRequest::from(model))
    }
}
