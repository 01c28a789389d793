//! Company roles, permissions, memberships and the per-request tenant context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::company::Company;
use crate::errors::{AppError, AppResult};

/// Name of the administrative role created for every company
pub const ADMIN_ROLE_NAME: &str = "Company Admin";

string_enum!(
    Resource {
        Projects => "projects",
        Expenses => "expenses",
        Contractors => "contractors",
        Reports => "reports",
        Users => "users",
        Company => "company",
        Billing => "billing",
    }
);

string_enum!(
    Action {
        View => "view",
        Create => "create",
        Edit => "edit",
        Delete => "delete",
        Approve => "approve",
        Export => "export",
    }
);

string_enum!(
    MembershipStatus {
        Active => "active",
        Invited => "invited",
        Suspended => "suspended",
        Left => "left",
    }
);

/// A single `(resource, action)` grant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Permission {
    pub resource: Resource,
    pub action: Action,
}

impl Permission {
    pub fn new(resource: Resource, action: Action) -> Self {
        Self { resource, action }
    }

    /// `resource:action` form used in messages
    pub fn codename(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    /// Every possible grant
    pub fn all() -> Vec<Permission> {
        Resource::ALL
            .iter()
            .flat_map(|r| Action::ALL.iter().map(move |a| Permission::new(*r, *a)))
            .collect()
    }
}

/// Company role
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    pub id: Uuid,
    pub company_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
    pub is_supervisor: bool,
    pub is_team_member: bool,
    pub permissions: Vec<Permission>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Role {
    pub fn allows(&self, resource: Resource, action: Action) -> bool {
        self.is_admin || self.permissions.contains(&Permission::new(resource, action))
    }
}

/// Role definition before it is attached to a company
#[derive(Debug, Clone, PartialEq)]
pub struct RoleTemplate {
    pub name: String,
    pub description: Option<String>,
    pub is_admin: bool,
    pub is_supervisor: bool,
    pub is_team_member: bool,
    pub permissions: Vec<Permission>,
}

impl RoleTemplate {
    pub fn into_role(self, company_id: Uuid) -> Role {
        let now = Utc::now();
        Role {
            id: Uuid::new_v4(),
            company_id,
            name: self.name,
            description: self.description,
            is_admin: self.is_admin,
            is_supervisor: self.is_supervisor,
            is_team_member: self.is_team_member,
            permissions: self.permissions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The three roles every new company starts with.
///
/// The admin role is always first.
pub fn default_roles() -> Vec<RoleTemplate> {
    let supervisor_permissions = Resource::ALL
        .iter()
        .flat_map(|r| {
            [Action::View, Action::Export]
                .into_iter()
                .map(move |a| Permission::new(*r, a))
        })
        .collect();

    let employee_permissions = [Resource::Projects, Resource::Expenses, Resource::Contractors]
        .into_iter()
        .flat_map(|r| {
            [Action::View, Action::Create, Action::Edit]
                .into_iter()
                .map(move |a| Permission::new(r, a))
        })
        .collect();

    vec![
        RoleTemplate {
            name: ADMIN_ROLE_NAME.to_string(),
            description: Some("Full access to all company features".to_string()),
            is_admin: true,
            is_supervisor: false,
            is_team_member: false,
            permissions: Permission::all(),
        },
        RoleTemplate {
            name: "Supervisor".to_string(),
            description: Some("Can view and export all company data".to_string()),
            is_admin: false,
            is_supervisor: true,
            is_team_member: false,
            permissions: supervisor_permissions,
        },
        RoleTemplate {
            name: "Employee".to_string(),
            description: Some("Can manage projects, expenses and contractors".to_string()),
            is_admin: false,
            is_supervisor: false,
            is_team_member: true,
            permissions: employee_permissions,
        },
    ]
}

/// A user's membership in a company
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_id: Uuid,
    pub role_id: Uuid,
    pub status: MembershipStatus,
    pub invited_by: Option<Uuid>,
    pub joined_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(user_id: Uuid, company_id: Uuid, role_id: Uuid, invited_by: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            company_id,
            role_id,
            status: MembershipStatus::Active,
            invited_by,
            joined_at: now,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Pick the company a user operates in: the last used one while its
/// membership is still active, otherwise the oldest active membership.
pub fn choose_membership(
    memberships: &[Membership],
    last_company_id: Option<Uuid>,
) -> Option<&Membership> {
    let active = || memberships.iter().filter(|m| m.is_active());

    last_company_id
        .and_then(|id| active().find(|m| m.company_id == id))
        .or_else(|| active().min_by_key(|m| m.joined_at))
}

/// Company, membership and role of the caller for the current request
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TenantContext {
    pub user_id: Uuid,
    pub company: Company,
    pub membership: Membership,
    pub role: Role,
}

impl TenantContext {
    pub fn company_id(&self) -> Uuid {
        self.company.id
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin
    }

    pub fn can(&self, resource: Resource, action: Action) -> bool {
        self.role.allows(resource, action)
    }

    /// Fail with a permission error unless the role carries the grant.
    pub fn require(&self, resource: Resource, action: Action) -> AppResult<()> {
        if self.can(resource, action) {
            Ok(())
        } else {
            tracing::warn!(
                user_id = %self.user_id,
                company_id = %self.company.id,
                permission = %Permission::new(resource, action).codename(),
                "Permission denied"
            );
            Err(AppError::permission(format!("{} {}", action, resource)))
        }
    }

    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }

    /// Non-admins may only hand out grants their own role carries.
    pub fn require_grantable(&self, permissions: &[Permission]) -> AppResult<()> {
        match permissions
            .iter()
            .find(|p| !self.can(p.resource, p.action))
        {
            Some(missing) => Err(AppError::permission(format!(
                "grant \"{}\"",
                missing.codename()
            ))),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn membership(company_id: Uuid, status: MembershipStatus, age_days: i64) -> Membership {
        let mut m = Membership::new(Uuid::new_v4(), company_id, Uuid::new_v4(), None);
        m.status = status;
        m.joined_at = Utc::now() - Duration::days(age_days);
        m
    }

    #[test]
    fn test_default_roles() {
        let roles = default_roles();
        assert_eq!(roles.len(), 3);

        let admin = roles[0].clone().into_role(Uuid::new_v4());
        assert_eq!(admin.name, ADMIN_ROLE_NAME);
        assert_eq!(admin.permissions.len(), Resource::ALL.len() * Action::ALL.len());

        let supervisor = roles[1].clone().into_role(Uuid::new_v4());
        assert!(supervisor.allows(Resource::Billing, Action::Export));
        assert!(!supervisor.allows(Resource::Projects, Action::Create));

        let employee = roles[2].clone().into_role(Uuid::new_v4());
        assert!(employee.allows(Resource::Expenses, Action::Edit));
        assert!(!employee.allows(Resource::Expenses, Action::Approve));
        assert!(!employee.allows(Resource::Reports, Action::View));
        assert_eq!(employee.permissions.len(), 9);
    }

    #[test]
    fn test_admin_role_allows_everything() {
        let mut admin = default_roles().remove(0).into_role(Uuid::new_v4());
        admin.permissions.clear();
        assert!(admin.allows(Resource::Billing, Action::Delete));
    }

    #[test]
    fn test_choose_membership_prefers_last_company() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let memberships = vec![
            membership(a, MembershipStatus::Active, 10),
            membership(b, MembershipStatus::Active, 1),
        ];

        assert_eq!(choose_membership(&memberships, Some(b)).unwrap().company_id, b);
        assert_eq!(choose_membership(&memberships, None).unwrap().company_id, a);
    }

    #[test]
    fn test_choose_membership_skips_inactive() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let memberships = vec![
            membership(a, MembershipStatus::Suspended, 10),
            membership(b, MembershipStatus::Active, 1),
        ];

        assert_eq!(choose_membership(&memberships, Some(a)).unwrap().company_id, b);
        assert!(choose_membership(&memberships[..1], None).is_none());
    }

    #[test]
    fn test_grants_limited_to_held_permissions() {
        let company_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let mut role = default_roles().remove(2).into_role(company_id);
        role.permissions.push(Permission::new(Resource::Users, Action::Edit));
        let company = crate::domain::NewCompany {
            name: "Acme".to_string(),
            slug: "acme".to_string(),
            ..crate::domain::NewCompany::default()
        }
        .into_company();
        let ctx = TenantContext {
            user_id,
            membership: Membership::new(user_id, company.id, role.id, None),
            company,
            role,
        };

        assert!(ctx
            .require_grantable(&[Permission::new(Resource::Expenses, Action::Edit)])
            .is_ok());
        assert!(matches!(
            ctx.require_grantable(&[Permission::new(Resource::Expenses, Action::Approve)]),
            Err(AppError::PermissionDenied(_))
        ));
    }

    #[test]
    fn test_permission_codename() {
        let p = Permission::new(Resource::Expenses, Action::Approve);
        assert_eq!(p.codename(), "expenses:approve");
    }
}
