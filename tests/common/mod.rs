//! Shared fixtures for service tests.
//!
//! Each test wires only the mock repositories it expects to be called;
//! any other repository panics on first use. Notifications are the
//! exception: by default they have no recipients and accept every write.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use construction_tracker::domain::{
    default_roles, Applicant, CompanyDetails, Membership, NewCompany, NewUser, RegistrationRequest,
    RequestMetadata, RequestType, Role, SuperOwner, TenantContext, User,
};
use construction_tracker::infra::repositories::{
    MockAccessRepository, MockCompanyRepository, MockContractorRepository, MockDocumentRepository,
    MockExpenseRepository, MockNotificationRepository, MockProjectRepository,
    MockRegistrationRepository,
    MockSuperOwnerRepository, MockUserRepository,
};
use construction_tracker::infra::{
    AccessRepository, AccountProvisioner, CompanyRepository, ContractorRepository,
    DocumentRepository, ExpenseRepository, MockAccountProvisioner, MockCacheStore,
    NotificationRepository, ProjectRepository, RegistrationRepository, SuperOwnerRepository, UnitOfWork, UserRepository,
};
use construction_tracker::jobs::MockMailer;
use construction_tracker::services::Notifier;

/// Unit of Work over mockall repositories
pub struct TestUnitOfWork {
    pub users: Arc<MockUserRepository>,
    pub super_owners: Arc<MockSuperOwnerRepository>,
    pub companies: Arc<MockCompanyRepository>,
    pub access: Arc<MockAccessRepository>,
    pub registrations: Arc<MockRegistrationRepository>,
    pub documents: Arc<MockDocumentRepository>,
    pub projects: Arc<MockProjectRepository>,
    pub expenses: Arc<MockExpenseRepository>,
    pub contractors: Arc<MockContractorRepository>,
    pub notifications: Arc<MockNotificationRepository>,
    pub provisioning: Arc<MockAccountProvisioner>,
}

impl Default for TestUnitOfWork {
    fn default() -> Self {
        Self {
            users: Arc::new(MockUserRepository::new()),
            super_owners: Arc::new(MockSuperOwnerRepository::new()),
            companies: Arc::new(MockCompanyRepository::new()),
            access: Arc::new(MockAccessRepository::new()),
            registrations: Arc::new(MockRegistrationRepository::new()),
            documents: Arc::new(MockDocumentRepository::new()),
            projects: Arc::new(MockProjectRepository::new()),
            expenses: Arc::new(MockExpenseRepository::new()),
            contractors: Arc::new(MockContractorRepository::new()),
            notifications: Arc::new(quiet_notifications()),
            provisioning: Arc::new(MockAccountProvisioner::new()),
        }
    }
}

impl TestUnitOfWork {
    pub fn with_users(mut self, repo: MockUserRepository) -> Self {
        self.users = Arc::new(repo);
        self
    }

    pub fn with_super_owners(mut self, repo: MockSuperOwnerRepository) -> Self {
        self.super_owners = Arc::new(repo);
        self
    }

    pub fn with_companies(mut self, repo: MockCompanyRepository) -> Self {
        self.companies = Arc::new(repo);
        self
    }

    pub fn with_access(mut self, repo: MockAccessRepository) -> Self {
        self.access = Arc::new(repo);
        self
    }

    pub fn with_registrations(mut self, repo: MockRegistrationRepository) -> Self {
        self.registrations = Arc::new(repo);
        self
    }

    pub fn with_documents(mut self, repo: MockDocumentRepository) -> Self {
        self.documents = Arc::new(repo);
        self
    }

    pub fn with_projects(mut self, repo: MockProjectRepository) -> Self {
        self.projects = Arc::new(repo);
        self
    }

    pub fn with_expenses(mut self, repo: MockExpenseRepository) -> Self {
        self.expenses = Arc::new(repo);
        self
    }

    pub fn with_contractors(mut self, repo: MockContractorRepository) -> Self {
        self.contractors = Arc::new(repo);
        self
    }

    pub fn with_notifications(mut self, repo: MockNotificationRepository) -> Self {
        self.notifications = Arc::new(repo);
        self
    }

    pub fn with_provisioning(mut self, provisioner: MockAccountProvisioner) -> Self {
        self.provisioning = Arc::new(provisioner);
        self
    }
}

impl UnitOfWork for TestUnitOfWork {
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

/// Notification store with nobody to notify and no stored preferences
pub fn quiet_notifications() -> MockNotificationRepository {
    let mut repo = MockNotificationRepository::new();
    repo.expect_recipients().returning(|_, _| Ok(vec![]));
    repo.expect_preferences().returning(|_, _, _| Ok(vec![]));
    repo.expect_create_many()
        .returning(|batch| Ok(batch.len() as u64));
    repo
}

/// Cache that grants every lock and swallows deletes
pub fn permissive_cache() -> MockCacheStore {
    let mut cache = MockCacheStore::new();
    cache
        .expect_acquire_lock()
        .returning(|_| Ok("lock-id".to_string()));
    cache.expect_release_lock().returning(|_, _| Ok(true));
    cache.expect_delete().returning(|_| Ok(()));
    cache
}

/// Notifier whose mailer accepts everything
pub fn quiet_notifier() -> Notifier {
    let mut mailer = MockMailer::new();
    mailer.expect_send().returning(|_| Ok(()));
    Notifier::new(Arc::new(mailer), "noreply@example.com")
}

pub fn user(username: &str, password_hash: &str, is_active: bool) -> User {
    NewUser {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: password_hash.to_string(),
        first_name: "Ada".to_string(),
        last_name: "Obi".to_string(),
        is_active,
        is_staff: false,
    }
    .into_user()
}

pub fn company_request() -> RegistrationRequest {
    RegistrationRequest::new(
        RequestType::CompanyRegistration,
        Applicant {
            email: "Owner@Acme.example".to_string(),
            username: "acme_owner".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            phone: None,
        },
        Some(CompanyDetails {
            name: "Acme Builders".to_string(),
            ..CompanyDetails::default()
        }),
        RequestMetadata::default(),
        7,
        Utc::now(),
    )
}

/// A company request created long enough ago to be past its expiry
pub fn expired_request() -> RegistrationRequest {
    let mut request = company_request();
    request.created_at = Utc::now() - Duration::days(30);
    request.expires_at = Utc::now() - Duration::days(1);
    request
}

pub fn primary_owner() -> SuperOwner {
    SuperOwner::primary(Uuid::new_v4())
}

/// The default roles of a fresh company, admin first
pub fn company_roles(company_id: Uuid) -> Vec<Role> {
    default_roles()
        .into_iter()
        .map(|template| template.into_role(company_id))
        .collect()
}

/// Caller context holding the given role in a fresh company
pub fn tenant_with(role_index: usize) -> TenantContext {
    let company = NewCompany {
        name: "Acme Builders".to_string(),
        slug: "acme-builders".to_string(),
        ..NewCompany::default()
    }
    .into_company();
    let role = company_roles(company.id).remove(role_index);
    let user_id = Uuid::new_v4();

    TenantContext {
        user_id,
        membership: Membership::new(user_id, company.id, role.id, None),
        company,
        role,
    }
}

/// Company admin context
pub fn admin_tenant() -> TenantContext {
    tenant_with(0)
}

/// Read-only supervisor context
pub fn supervisor_tenant() -> TenantContext {
    tenant_with(1)
}
