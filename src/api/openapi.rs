//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::handlers::{
    auth_handler, company_handler, contractor_handler, dashboard_handler, expense_handler,
    health_handler, notification_handler, project_handler, registration_handler,
    super_owner_handler,
};
use crate::domain::{
    AccountType, Applicant, AssignmentInput, CategoryTotal, Company, CompanyDetails, CompanyStats,
    Contractor, ContractorAssignment, ContractorInput, ContractorType, DashboardSummary,
    DelegationLevel, Document, DocumentStatus, DocumentType, Expense, ExpenseCategory,
    ExpenseInput, ExpenseStatus, ExpenseType, Membership, MembershipStatus, Notification,
    NotificationKind, NotificationPreference, NotificationPriority, Permission, PreferenceUpdate,
    Priority,
    Project, ProjectFinancials, ProjectInput, ProjectStatus, RegistrationRequest, RequestMetadata,
    RequestStatus, RequestType, ReviewDecision, Role, StatusCount, SubscriptionType, SuperOwner,
    SuperOwnerFlags, TenantContext, TrendPoint, UserProfile, UserResponse,
};
use crate::services::{
    ApprovalOutcome, BulkAction, BulkActionReport, BulkActionRequest, BulkFailure, CategoryInput,
    CompanyDetail, CompanyRegistrationForm, CompanySummary, DocumentReview, ExpenseView, ExportKind,
    IndividualRegistrationForm, InviteMemberRequest, MarkPaidRequest, MemberUpdate, MemberView,
    NewSuperOwnerRequest, ProfileResponse, ProfileUpdate, ProjectDetail, RegistrationDetail,
    RequestStatusCount, RoleInput, SubmissionReceipt, SuperOwnerView, SystemAnalytics,
    TokenResponse, UserDetail,
};
use crate::types::{
    CompanyPage, ContractorPage, ExpensePage, MessageResponse, NotificationPage, PaginationMeta,
    ProjectPage, RegistrationPage, UserPage,
};

/// OpenAPI documentation for the Construction Tracker API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Construction Tracker",
        version = "0.1.0",
        description = "Multi-tenant construction project and expense tracking with an approval-gated onboarding workflow",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        // Health
        health_handler::health,
        health_handler::ready,
        health_handler::alive,
        // Authentication
        auth_handler::login,
        auth_handler::logout,
        auth_handler::me,
        auth_handler::update_me,
        auth_handler::change_password,
        // Registration
        registration_handler::submit_company,
        registration_handler::submit_individual,
        registration_handler::status,
        registration_handler::upload_document,
        registration_handler::resubmit,
        // Super owner console
        super_owner_handler::list_registrations,
        super_owner_handler::get_registration,
        super_owner_handler::mark_under_review,
        super_owner_handler::require_documents,
        super_owner_handler::approve,
        super_owner_handler::reject,
        super_owner_handler::bulk_action,
        super_owner_handler::list_documents,
        super_owner_handler::review_document,
        super_owner_handler::download_document,
        super_owner_handler::list_companies,
        super_owner_handler::company_detail,
        super_owner_handler::toggle_company_status,
        super_owner_handler::company_stats,
        super_owner_handler::list_users,
        super_owner_handler::user_detail,
        super_owner_handler::toggle_user_status,
        super_owner_handler::list_super_owners,
        super_owner_handler::create_super_owner,
        super_owner_handler::system_analytics,
        super_owner_handler::export_data,
        // Company
        company_handler::my_companies,
        company_handler::switch_company,
        company_handler::list_roles,
        company_handler::create_role,
        company_handler::update_role,
        company_handler::delete_role,
        company_handler::list_members,
        company_handler::invite_member,
        company_handler::update_member,
        // Projects
        project_handler::list_projects,
        project_handler::get_project,
        project_handler::create_project,
        project_handler::update_project,
        project_handler::delete_project,
        project_handler::assign_contractor,
        project_handler::remove_contractor,
        // Expenses
        expense_handler::list_expenses,
        expense_handler::get_expense,
        expense_handler::create_expense,
        expense_handler::update_expense,
        expense_handler::delete_expense,
        expense_handler::approve_expense,
        expense_handler::mark_paid,
        expense_handler::list_categories,
        expense_handler::create_category,
        expense_handler::update_category,
        expense_handler::delete_category,
        // Contractors
        contractor_handler::list_contractors,
        contractor_handler::get_contractor,
        contractor_handler::create_contractor,
        contractor_handler::update_contractor,
        contractor_handler::delete_contractor,
        // Dashboard
        dashboard_handler::dashboard,
        // Notifications
        notification_handler::list_notifications,
        notification_handler::unread_count,
        notification_handler::mark_read,
        notification_handler::mark_all_read,
        notification_handler::preferences,
        notification_handler::update_preferences,
    ),
    components(
        schemas(
            // Accounts
            AccountType,
            UserResponse,
            UserProfile,
            TokenResponse,
            ProfileResponse,
            ProfileUpdate,
            MessageResponse,
            auth_handler::LoginRequest,
            auth_handler::ChangePasswordRequest,
            // Registration
            RequestType,
            RequestStatus,
            Applicant,
            CompanyDetails,
            RequestMetadata,
            RegistrationRequest,
            CompanyRegistrationForm,
            IndividualRegistrationForm,
            SubmissionReceipt,
            RegistrationDetail,
            ApprovalOutcome,
            BulkAction,
            BulkActionRequest,
            BulkActionReport,
            BulkFailure,
            super_owner_handler::DocumentsRequiredRequest,
            super_owner_handler::RejectRequest,
            // Documents
            DocumentType,
            DocumentStatus,
            ReviewDecision,
            Document,
            DocumentReview,
            // Super owners
            DelegationLevel,
            SuperOwnerFlags,
            SuperOwner,
            SuperOwnerView,
            NewSuperOwnerRequest,
            SystemAnalytics,
            RequestStatusCount,
            ExportKind,
            CompanyDetail,
            UserDetail,
            // Companies and access
            SubscriptionType,
            Company,
            CompanyStats,
            CompanySummary,
            Permission,
            Role,
            RoleInput,
            MembershipStatus,
            Membership,
            MemberView,
            InviteMemberRequest,
            MemberUpdate,
            TenantContext,
            // Projects
            ProjectStatus,
            Priority,
            Project,
            ProjectInput,
            ProjectFinancials,
            ProjectDetail,
            ContractorAssignment,
            AssignmentInput,
            // Expenses
            ExpenseType,
            ExpenseStatus,
            Expense,
            ExpenseInput,
            ExpenseView,
            ExpenseCategory,
            CategoryInput,
            MarkPaidRequest,
            // Contractors
            ContractorType,
            Contractor,
            ContractorInput,
            // Dashboard
            DashboardSummary,
            TrendPoint,
            StatusCount,
            CategoryTotal,
            // Notifications
            NotificationKind,
            NotificationPriority,
            Notification,
            NotificationPreference,
            PreferenceUpdate,
            notification_handler::PreferencesRequest,
            notification_handler::UnreadCount,
            notification_handler::MarkedRead,
            // Health
            health_handler::HealthResponse,
            health_handler::ServiceHealth,
            health_handler::ServiceStatus,
            // Pagination
            PaginationMeta,
            RegistrationPage,
            CompanyPage,
            UserPage,
            ProjectPage,
            ExpensePage,
            ContractorPage,
            NotificationPage,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health, readiness and liveness checks"),
        (name = "Authentication", description = "Login, logout and the caller's own account"),
        (name = "Registration", description = "Public registration requests and document upload"),
        (name = "Super Owner", description = "Registration review and system administration"),
        (name = "Company", description = "Company context, roles and members"),
        (name = "Projects", description = "Construction projects and contractor assignments"),
        (name = "Expenses", description = "Expenses, approvals and categories"),
        (name = "Contractors", description = "Contractor directory"),
        (name = "Dashboard", description = "Company-wide financial summary"),
        (name = "Notifications", description = "In-app notifications and delivery preferences")
    )
)]
pub struct ApiDoc;

/// Security scheme modifier for JWT Bearer authentication
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT token obtained from /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_console_and_tenant_paths() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/auth/login"));
        assert!(paths.contains_key("/register/company"));
        assert!(paths.contains_key("/super-owner/registrations/{id}/approve"));
        assert!(paths.contains_key("/projects/{id}/contractors/{assignment_id}"));
        assert!(paths.contains_key("/expenses/categories"));
        assert!(paths.contains_key("/dashboard"));
        assert!(paths.contains_key("/notifications/{id}/read"));
        assert!(paths.contains_key("/super-owner/export/{kind}"));
        assert!(paths.contains_key("/health/"));
    }

    #[test]
    fn test_bearer_scheme_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}
