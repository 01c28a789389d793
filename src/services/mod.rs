//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.
//!
//! All services use the Unit of Work pattern for centralized repository
//! access; multi-row writes go through the account provisioner.

mod auth_service;
pub mod container;
mod contractor_service;
mod dashboard_service;
mod document_service;
mod expense_service;
mod notification_service;
pub mod notifications;
mod project_service;
mod registration_service;
mod super_owner_service;
mod tenancy_service;

// Service Container
pub use container::{parallel, ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{
    AuthService, Authenticator, Claims, ProfileResponse, ProfileUpdate, TokenResponse,
};
pub use contractor_service::{ContractorManager, ContractorService};
pub use dashboard_service::{DashboardManager, DashboardService};
pub use document_service::{
    DocumentDownload, DocumentManager, DocumentReview, DocumentService, DocumentUpload,
};
pub use expense_service::{
    CategoryInput, ExpenseManager, ExpenseService, ExpenseView, MarkPaidRequest,
};
pub use notification_service::{NotificationCenter, NotificationService};
pub use notifications::Notifier;
pub use project_service::{ProjectDetail, ProjectManager, ProjectService};
pub use registration_service::{
    ApprovalOutcome, BulkAction, BulkActionReport, BulkActionRequest, BulkFailure,
    CompanyRegistrationForm, IndividualRegistrationForm, RegistrationDetail, RegistrationManager,
    RegistrationService, SubmissionReceipt,
};
pub use super_owner_service::{
    ensure_flag, CompanyDetail, CsvExport, ExportKind, NewSuperOwnerRequest, RequestStatusCount,
    SuperOwnerConsole, SuperOwnerService, SuperOwnerView, SystemAnalytics, UserDetail,
};
pub use tenancy_service::{
    CompanySummary, InviteMemberRequest, MemberUpdate, MemberView, RoleInput, TenancyService,
    TenantManager,
};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
