//! Super owners: system-wide administrators with delegated flags.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

string_enum!(
    /// Preset bundles of super-owner flags
    DelegationLevel {
        ReadOnly => "read_only",
        Full => "full",
        CompanyManagement => "company_management",
        UserManagement => "user_management",
        BillingManagement => "billing_management",
    }
);

/// Individual super-owner capabilities
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuperOwnerPermission {
    ManageCompanies,
    ManageUsers,
    ActivateAccounts,
    AccessAdmin,
    DelegatePermissions,
    ManageBilling,
    ViewSystemAnalytics,
}

impl SuperOwnerPermission {
    pub fn describe(&self) -> &'static str {
        match self {
            SuperOwnerPermission::ManageCompanies => "manage companies",
            SuperOwnerPermission::ManageUsers => "manage users",
            SuperOwnerPermission::ActivateAccounts => "activate accounts",
            SuperOwnerPermission::AccessAdmin => "access the admin console",
            SuperOwnerPermission::DelegatePermissions => "delegate permissions",
            SuperOwnerPermission::ManageBilling => "manage billing",
            SuperOwnerPermission::ViewSystemAnalytics => "view system analytics",
        }
    }
}

/// Flag set carried by every super owner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SuperOwnerFlags {
    pub can_manage_companies: bool,
    pub can_manage_users: bool,
    pub can_activate_accounts: bool,
    pub can_access_admin: bool,
    pub can_delegate_permissions: bool,
    pub can_manage_billing: bool,
    pub can_view_system_analytics: bool,
}

impl SuperOwnerFlags {
    pub fn all() -> Self {
        Self {
            can_manage_companies: true,
            can_manage_users: true,
            can_activate_accounts: true,
            can_access_admin: true,
            can_delegate_permissions: true,
            can_manage_billing: true,
            can_view_system_analytics: true,
        }
    }

    pub fn has(&self, permission: SuperOwnerPermission) -> bool {
        match permission {
            SuperOwnerPermission::ManageCompanies => self.can_manage_companies,
            SuperOwnerPermission::ManageUsers => self.can_manage_users,
            SuperOwnerPermission::ActivateAccounts => self.can_activate_accounts,
            SuperOwnerPermission::AccessAdmin => self.can_access_admin,
            SuperOwnerPermission::DelegatePermissions => self.can_delegate_permissions,
            SuperOwnerPermission::ManageBilling => self.can_manage_billing,
            SuperOwnerPermission::ViewSystemAnalytics => self.can_view_system_analytics,
        }
    }
}

impl DelegationLevel {
    /// Flags implied by a delegation level
    pub fn default_flags(&self) -> SuperOwnerFlags {
        match self {
            DelegationLevel::Full => SuperOwnerFlags::all(),
            DelegationLevel::CompanyManagement => SuperOwnerFlags {
                can_manage_companies: true,
                can_view_system_analytics: true,
                ..SuperOwnerFlags::default()
            },
            DelegationLevel::UserManagement => SuperOwnerFlags {
                can_manage_users: true,
                can_activate_accounts: true,
                ..SuperOwnerFlags::default()
            },
            DelegationLevel::BillingManagement => SuperOwnerFlags {
                can_manage_billing: true,
                can_view_system_analytics: true,
                ..SuperOwnerFlags::default()
            },
            DelegationLevel::ReadOnly => SuperOwnerFlags {
                can_view_system_analytics: true,
                ..SuperOwnerFlags::default()
            },
        }
    }
}

/// Super owner record linked to a user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SuperOwner {
    pub id: Uuid,
    pub user_id: Uuid,
    pub is_primary_owner: bool,
    pub delegation_level: DelegationLevel,
    #[serde(flatten)]
    pub flags: SuperOwnerFlags,
    /// Companies this owner may manage; empty means all
    pub allowed_company_ids: Vec<Uuid>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SuperOwner {
    /// The single primary owner, holding every flag.
    pub fn primary(user_id: Uuid) -> Self {
        Self::delegated(user_id, DelegationLevel::Full, None, Vec::new(), None).into_primary()
    }

    /// A delegated super owner; `flags` overrides the level presets when given.
    pub fn delegated(
        user_id: Uuid,
        level: DelegationLevel,
        flags: Option<SuperOwnerFlags>,
        allowed_company_ids: Vec<Uuid>,
        created_by: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            is_primary_owner: false,
            delegation_level: level,
            flags: flags.unwrap_or_else(|| level.default_flags()),
            allowed_company_ids,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Promote to primary owner; the primary always has full delegation.
    pub fn into_primary(mut self) -> Self {
        self.is_primary_owner = true;
        self.normalize();
        self
    }

    /// Enforce the primary-owner invariant.
    pub fn normalize(&mut self) {
        if self.is_primary_owner {
            self.delegation_level = DelegationLevel::Full;
            self.flags = SuperOwnerFlags::all();
            self.allowed_company_ids.clear();
        }
    }

    pub fn has(&self, permission: SuperOwnerPermission) -> bool {
        self.is_primary_owner || self.flags.has(permission)
    }

    /// Whether this owner may see the given company
    pub fn can_access_company(&self, company_id: Uuid) -> bool {
        self.is_primary_owner
            || self.allowed_company_ids.is_empty()
            || self.allowed_company_ids.contains(&company_id)
    }

    /// Whether this owner may change the given company
    pub fn can_manage_company(&self, company_id: Uuid) -> bool {
        self.has(SuperOwnerPermission::ManageCompanies) && self.can_access_company(company_id)
    }

    /// Company filter for listings; `None` means unrestricted.
    pub fn company_scope(&self) -> Option<&[Uuid]> {
        if self.is_primary_owner || self.allowed_company_ids.is_empty() {
            None
        } else {
            Some(&self.allowed_company_ids)
        }
    }

    pub fn display_title(&self) -> String {
        if self.is_primary_owner {
            "Primary Owner".to_string()
        } else {
            format!("Super Admin ({})", self.delegation_level)
        }
    }
}
