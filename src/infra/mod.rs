//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connections and repositories
//! - Caching, rate limiting and locks (Redis)
//! - Document storage on local disk
//! - Unit of Work for transaction management

pub mod cache;
pub mod db;
pub mod provisioning;
pub mod repositories;
pub mod storage;
pub mod unit_of_work;

pub use cache::{Cache, CacheStore};
pub use db::{Database, Migrator};
pub use provisioning::{AccountProvisioner, MemberGrant, ProvisionedAccount, ProvisioningStore};
pub use repositories::{
    AccessRepository, CompanyRepository, ContractorRepository, DocumentRepository,
    ExpenseRepository, NotificationRepository, ProjectRepository, RegistrationRepository,
    SuperOwnerRepository, UserRepository,
};
pub use storage::{DocumentStorage, LocalStorage};
pub use unit_of_work::{run_in_transaction, Persistence, TransactionContext, UnitOfWork};

#[cfg(any(test, feature = "test-utils"))]
pub use cache::MockCacheStore;
#[cfg(any(test, feature = "test-utils"))]
pub use provisioning::MockAccountProvisioner;
#[cfg(any(test, feature = "test-utils"))]
pub use storage::MockDocumentStorage;
