//! Domain layer - Core business entities and logic
//!
//! This module contains the core domain models that represent
//! business concepts independent of infrastructure concerns:
//! accounts and super owners, companies and their roles, the
//! registration workflow, and project/expense/contractor tracking.

/// Declares a string-backed enum with serde/OpenAPI support,
/// `as_str`, `Display`, `FromStr` and a lenient `from_db`.
///
/// The first variant is the fallback used by `from_db`.
macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $first:ident => $first_value:literal $(, $variant:ident => $value:literal)* $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize, utoipa::ToSchema,
        )]
        pub enum $name {
            #[serde(rename = $first_value)]
            $first,
            $(
                #[serde(rename = $value)]
                $variant,
            )*
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$name::$first $(, $name::$variant)*];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $name::$first => $first_value,
                    $($name::$variant => $value,)*
                }
            }

            /// Parse a stored value, falling back to the first variant.
            pub fn from_db(value: &str) -> Self {
                value.parse().unwrap_or_else(|_| {
                    tracing::warn!(value = %value, kind = stringify!($name), "Unknown stored value");
                    $name::$first
                })
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$first
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = crate::errors::AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $first_value => Ok($name::$first),
                    $($value => Ok($name::$variant),)*
                    other => Err(crate::errors::AppError::validation(format!(
                        "Invalid {}: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod access;
pub mod company;
pub mod contractor;
pub mod dashboard;
pub mod document;
pub mod expense;
pub mod notification;
pub mod password;
pub mod project;
pub mod registration;
pub mod super_owner;
pub mod user;

pub use access::{
    choose_membership, default_roles, Action, Membership, MembershipStatus, Permission, Resource, Role,
    RoleTemplate, TenantContext, ADMIN_ROLE_NAME,
};
pub use company::{slugify, unique_slug, Company, CompanyStats, NewCompany, SubscriptionType};
pub use contractor::{Contractor, ContractorInput, ContractorType};
pub use dashboard::{CategoryTotal, DashboardSummary, StatusCount, TrendPoint};
pub use document::{Document, DocumentStatus, DocumentType, ReviewDecision};
pub use expense::{
    normalize_color, sum_amounts, Expense, ExpenseCategory, ExpenseInput, ExpenseStatus,
    ExpenseType,
};
pub use notification::{
    crosses_budget_alert, Audience, Notification, NotificationKind, NotificationPreference,
    NotificationPriority, PreferenceUpdate,
};
pub use password::{generate_temp_password, generate_token, Password};
pub use project::{
    AssignmentInput, ContractorAssignment, Priority, Project, ProjectFinancials, ProjectInput, ProjectStatus,
};
pub use registration::{
    Applicant, ClientMeta, CompanyDetails, RegistrationRequest, RequestMetadata, RequestStatus,
    RequestType,
};
pub use super_owner::{DelegationLevel, SuperOwner, SuperOwnerFlags, SuperOwnerPermission};
pub use user::{AccountType, NewUser, User, UserProfile, UserResponse};
