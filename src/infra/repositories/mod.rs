//! Repository layer - Data access abstraction
//!
//! Each repository is a trait (mockable with the `test-utils` feature)
//! plus a SeaORM-backed `*Store` implementation.

mod access_repository;
mod base;
mod company_repository;
mod contractor_repository;
pub(crate) mod entities;
mod expense_repository;
mod notification_repository;
mod project_repository;
mod registration_repository;
mod super_owner_repository;
mod user_repository;

pub(crate) use base::update_error;

pub use access_repository::{AccessRepository, AccessStore};
pub use company_repository::{CompanyRepository, CompanyStore};
pub use contractor_repository::{ContractorRepository, ContractorStore};
pub use expense_repository::{ExpenseRepository, ExpenseStore};
pub use notification_repository::{NotificationRepository, NotificationStore};
pub use project_repository::{ProjectRepository, ProjectStore};
pub use registration_repository::{
    DocumentRepository, DocumentStore, RegistrationRepository, RegistrationStore,
};
pub use super_owner_repository::{SuperOwnerRepository, SuperOwnerStore};
pub use user_repository::{UserRepository, UserStore};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use access_repository::MockAccessRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use company_repository::MockCompanyRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use contractor_repository::MockContractorRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use expense_repository::MockExpenseRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use notification_repository::MockNotificationRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use project_repository::MockProjectRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use registration_repository::{MockDocumentRepository, MockRegistrationRepository};
#[cfg(any(test, feature = "test-utils"))]
pub use super_owner_repository::MockSuperOwnerRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
