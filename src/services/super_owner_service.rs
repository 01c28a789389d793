//! Super-owner console - system-wide management of companies, users and
//! other super owners.
//!
//! Every operation takes the acting [`SuperOwner`] and checks the flag it
//! needs. Restricted owners only ever see their allowed companies.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::container::parallel;
use crate::domain::{
    AccountType, Company, CompanyStats, DelegationLevel, Membership, NewUser, Password,
    RequestStatus, SuperOwner, SuperOwnerFlags, SuperOwnerPermission, UserProfile, UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;
use crate::types::{Paginated, PaginationParams};

const ALL_PERMISSIONS: [SuperOwnerPermission; 7] = [
    SuperOwnerPermission::ManageCompanies,
    SuperOwnerPermission::ManageUsers,
    SuperOwnerPermission::ActivateAccounts,
    SuperOwnerPermission::AccessAdmin,
    SuperOwnerPermission::DelegatePermissions,
    SuperOwnerPermission::ManageBilling,
    SuperOwnerPermission::ViewSystemAnalytics,
];

/// Fail unless `owner` holds `permission`.
pub fn ensure_flag(owner: &SuperOwner, permission: SuperOwnerPermission) -> AppResult<()> {
    if owner.has(permission) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %owner.user_id,
            permission = permission.describe(),
            "Super owner lacks permission"
        );
        Err(AppError::permission(permission.describe()))
    }
}

fn ensure_company_access(owner: &SuperOwner, company_id: Uuid) -> AppResult<()> {
    if owner.can_access_company(company_id) {
        Ok(())
    } else {
        Err(AppError::permission("access this company"))
    }
}

/// A delegator can only hand out what it holds itself.
fn check_delegation(actor: &SuperOwner, owner: &SuperOwner) -> AppResult<()> {
    if actor.is_primary_owner {
        return Ok(());
    }
    if let Some(missing) = ALL_PERMISSIONS
        .iter()
        .find(|p| owner.flags.has(**p) && !actor.has(**p))
    {
        return Err(AppError::permission(format!("delegate \"{}\"", missing.describe())));
    }
    if let Some(scope) = actor.company_scope() {
        if owner.allowed_company_ids.is_empty()
            || owner.allowed_company_ids.iter().any(|id| !scope.contains(id))
        {
            return Err(AppError::permission("delegate companies outside your scope"));
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyDetail {
    pub company: Company,
    pub stats: CompanyStats,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetail {
    pub user: UserResponse,
    pub profile: Option<UserProfile>,
    pub memberships: Vec<Membership>,
    pub super_owner: Option<SuperOwner>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SuperOwnerView {
    pub owner: SuperOwner,
    pub title: String,
    pub user: Option<UserResponse>,
}

/// Grant super-owner rights to an existing user
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct NewSuperOwnerRequest {
    pub user_id: Uuid,
    pub delegation_level: DelegationLevel,
    /// Overrides the level presets when given
    pub flags: Option<SuperOwnerFlags>,
    /// Empty means every company
    #[serde(default)]
    pub allowed_company_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RequestStatusCount {
    pub status: RequestStatus,
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SystemAnalytics {
    pub total_users: u64,
    pub active_users: u64,
    pub total_companies: u64,
    pub active_companies: u64,
    pub total_projects: u64,
    pub active_projects: u64,
    pub total_expenses: i64,
    pub pending_requests: u64,
    pub requests_by_status: Vec<RequestStatusCount>,
}

/// Data set offered as a CSV download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    Companies,
    Users,
    Requests,
}

impl ExportKind {
    pub fn filename(&self) -> &'static str {
        match self {
            Self::Companies => "companies.csv",
            Self::Users => "users.csv",
            Self::Requests => "registration_requests.csv",
        }
    }
}

impl FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "companies" => Ok(Self::Companies),
            "users" => Ok(Self::Users),
            "requests" => Ok(Self::Requests),
            other => Err(AppError::validation(format!("Unknown export \"{}\"", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: &'static str,
    pub bytes: Vec<u8>,
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn or_dash(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

fn write_csv(header: &[&str], rows: Vec<Vec<String>>) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(header)
        .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
    for row in rows {
        writer
            .write_record(&row)
            .map_err(|e| AppError::internal(format!("CSV write failed: {}", e)))?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::internal(format!("CSV flush failed: {}", e)))
}

#[async_trait]
pub trait SuperOwnerService: Send + Sync {
    /// The caller's super-owner record, or a forbidden error
    async fn require_super_owner(&self, user_id: Uuid) -> AppResult<SuperOwner>;

    /// As [`require_super_owner`](Self::require_super_owner), also checking a flag
    async fn require(
        &self,
        user_id: Uuid,
        permission: SuperOwnerPermission,
    ) -> AppResult<SuperOwner>;

    async fn list_companies(
        &self,
        actor: &SuperOwner,
        search: Option<String>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Company>>;

    async fn company_detail(&self, actor: &SuperOwner, id: Uuid) -> AppResult<CompanyDetail>;

    async fn toggle_company_status(&self, actor: &SuperOwner, id: Uuid) -> AppResult<Company>;

    async fn company_stats(&self, actor: &SuperOwner, id: Uuid) -> AppResult<CompanyStats>;

    async fn list_users(
        &self,
        actor: &SuperOwner,
        search: Option<String>,
        params: PaginationParams,
    ) -> AppResult<Paginated<UserResponse>>;

    async fn user_detail(&self, actor: &SuperOwner, id: Uuid) -> AppResult<UserDetail>;

    async fn toggle_user_status(&self, actor: &SuperOwner, id: Uuid) -> AppResult<UserResponse>;

    async fn list_super_owners(&self, actor: &SuperOwner) -> AppResult<Vec<SuperOwnerView>>;

    async fn create_super_owner(
        &self,
        actor: &SuperOwner,
        request: NewSuperOwnerRequest,
    ) -> AppResult<SuperOwner>;

    async fn system_analytics(&self, actor: &SuperOwner) -> AppResult<SystemAnalytics>;

    /// CSV download of companies, users or registration requests.
    /// Companies are limited to the actor's scope.
    async fn export(&self, actor: &SuperOwner, kind: ExportKind) -> AppResult<CsvExport>;

    /// Create or promote the primary owner from the command line
    async fn bootstrap_primary_owner(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> AppResult<SuperOwner>;
}

pub struct SuperOwnerConsole<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> SuperOwnerConsole<U> {
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }

    async fn stats_for(&self, company_id: Uuid) -> AppResult<CompanyStats> {
        let access = self.uow.access();
        let projects = self.uow.projects();
        let expenses = self.uow.expenses();

        let (member_count, active_member_count, project_count) = parallel::join3(
            access.count_members(company_id, false),
            access.count_members(company_id, true),
            projects.count(Some(company_id), false),
        )
        .await?;
        let (active_project_count, total_budget, total_expenses) = parallel::join3(
            projects.count(Some(company_id), true),
            projects.total_budget(company_id),
            expenses.total_actual(Some(company_id)),
        )
        .await?;

        Ok(CompanyStats {
            member_count,
            active_member_count,
            project_count,
            active_project_count,
            total_budget,
            total_expenses,
        })
    }

    async fn export_companies(&self, actor: &SuperOwner) -> AppResult<Vec<u8>> {
        let scope = actor.company_scope().map(|ids| ids.to_vec());
        let companies = self.uow.companies().all(scope).await?;
        let counts: HashMap<Uuid, u64> = self
            .uow
            .access()
            .member_counts(companies.iter().map(|c| c.id).collect())
            .await?
            .into_iter()
            .collect();

        let rows = companies
            .iter()
            .map(|company| {
                vec![
                    company.name.clone(),
                    company.email.clone().unwrap_or_default(),
                    or_dash(company.description.as_deref()),
                    company.created_at.format("%Y-%m-%d").to_string(),
                    yes_no(company.is_active).to_string(),
                    counts.get(&company.id).copied().unwrap_or(0).to_string(),
                ]
            })
            .collect();
        write_csv(
            &["Name", "Email", "Description", "Created", "Active", "Members"],
            rows,
        )
    }

    async fn export_users(&self) -> AppResult<Vec<u8>> {
        let users = self.uow.users();
        let (accounts, profiles) = parallel::join2(users.all(), users.all_profiles()).await?;
        let profiles: HashMap<Uuid, UserProfile> =
            profiles.into_iter().map(|p| (p.user_id, p)).collect();

        let rows = accounts
            .iter()
            .map(|user| {
                let profile = profiles.get(&user.id);
                vec![
                    user.username.clone(),
                    user.full_name(),
                    user.email.clone(),
                    profile
                        .map_or(AccountType::Individual, |p| p.account_type)
                        .to_string(),
                    user.created_at.format("%Y-%m-%d").to_string(),
                    yes_no(user.is_active).to_string(),
                    yes_no(profile.is_some_and(|p| p.is_verified)).to_string(),
                ]
            })
            .collect();
        write_csv(
            &["Username", "Name", "Email", "Account Type", "Joined", "Active", "Verified"],
            rows,
        )
    }

    async fn export_requests(&self) -> AppResult<Vec<u8>> {
        let requests = self.uow.registrations().all().await?;
        let mut reviewer_ids: Vec<Uuid> = requests.iter().filter_map(|r| r.reviewed_by).collect();
        reviewer_ids.sort_unstable();
        reviewer_ids.dedup();
        let reviewers: HashMap<Uuid, String> = self
            .uow
            .users()
            .find_by_ids(reviewer_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.full_name()))
            .collect();

        let rows = requests
            .iter()
            .map(|request| {
                let approved_by = request
                    .reviewed_by
                    .filter(|_| request.status == RequestStatus::Approved)
                    .and_then(|id| reviewers.get(&id).cloned());
                vec![
                    request.created_at.format("%Y-%m-%d").to_string(),
                    request.request_type.to_string(),
                    request.full_name(),
                    request.email.clone(),
                    or_dash(request.company_name.as_deref()),
                    request.status.to_string(),
                    or_dash(approved_by.as_deref()),
                ]
            })
            .collect();
        write_csv(
            &["Date", "Type", "Name", "Email", "Company", "Status", "Approved By"],
            rows,
        )
    }

    async fn load_company(&self, actor: &SuperOwner, id: Uuid) -> AppResult<Company> {
        ensure_company_access(actor, id)?;
        self.uow.companies().find_by_id(id).await?.ok_or_not_found()
    }
}

#[async_trait]
impl<U: UnitOfWork> SuperOwnerService for SuperOwnerConsole<U> {
    async fn require_super_owner(&self, user_id: Uuid) -> AppResult<SuperOwner> {
        self.uow
            .super_owners()
            .find_by_user(user_id)
            .await?
            .ok_or(AppError::Forbidden)
    }

    async fn require(
        &self,
        user_id: Uuid,
        permission: SuperOwnerPermission,
    ) -> AppResult<SuperOwner> {
        let owner = self.require_super_owner(user_id).await?;
        ensure_flag(&owner, permission)?;
        Ok(owner)
    }

    async fn list_companies(
        &self,
        actor: &SuperOwner,
        search: Option<String>,
        params: PaginationParams,
    ) -> AppResult<Paginated<Company>> {
        ensure_flag(actor, SuperOwnerPermission::ManageCompanies)?;
        let scope = actor.company_scope().map(|ids| ids.to_vec());
        let page = self.uow.companies().list(search, scope, &params).await?;
        Ok(Paginated::from_page(page, &params))
    }

    async fn company_detail(&self, actor: &SuperOwner, id: Uuid) -> AppResult<CompanyDetail> {
        ensure_flag(actor, SuperOwnerPermission::ManageCompanies)?;
        let company = self.load_company(actor, id).await?;
        let stats = self.stats_for(id).await?;
        Ok(CompanyDetail { company, stats })
    }

    async fn toggle_company_status(&self, actor: &SuperOwner, id: Uuid) -> AppResult<Company> {
        if !actor.can_manage_company(id) {
            return Err(AppError::permission("manage this company"));
        }
        let mut company = self.load_company(actor, id).await?;
        company.is_active = !company.is_active;
        let company = self.uow.companies().update(company).await?;

        tracing::info!(
            company_id = %company.id,
            active = company.is_active,
            by = %actor.user_id,
            "Company status toggled"
        );
        Ok(company)
    }

    async fn company_stats(&self, actor: &SuperOwner, id: Uuid) -> AppResult<CompanyStats> {
        ensure_flag(actor, SuperOwnerPermission::ManageCompanies)?;
        self.load_company(actor, id).await?;
        self.stats_for(id).await
    }

    async fn list_users(
        &self,
        actor: &SuperOwner,
        search: Option<String>,
        params: PaginationParams,
    ) -> AppResult<Paginated<UserResponse>> {
        ensure_flag(actor, SuperOwnerPermission::ManageUsers)?;
        let page = self.uow.users().list(search, &params).await?;
        Ok(Paginated::from_page(page, &params).map(UserResponse::from))
    }

    async fn user_detail(&self, actor: &SuperOwner, id: Uuid) -> AppResult<UserDetail> {
        ensure_flag(actor, SuperOwnerPermission::ManageUsers)?;
        let user = self.uow.users().find_by_id(id).await?.ok_or_not_found()?;

        let (profile, memberships, super_owner) = parallel::join3(
            self.uow.users().find_profile(id),
            self.uow.access().memberships_for_user(id),
            self.uow.super_owners().find_by_user(id),
        )
        .await?;
        let memberships = memberships
            .into_iter()
            .filter(|m| actor.can_access_company(m.company_id))
            .collect();

        Ok(UserDetail {
            user: UserResponse::from(user),
            profile,
            memberships,
            super_owner,
        })
    }

    async fn toggle_user_status(&self, actor: &SuperOwner, id: Uuid) -> AppResult<UserResponse> {
        ensure_flag(actor, SuperOwnerPermission::ManageUsers)?;
        if id == actor.user_id {
            return Err(AppError::business("You cannot change your own account status"));
        }

        let users = self.uow.users();
        let mut user = users.find_by_id(id).await?.ok_or_not_found()?;
        // Super owners can be reactivated here but never deactivated
        if user.is_active && self.uow.super_owners().find_by_user(id).await?.is_some() {
            tracing::warn!(user_id = %id, by = %actor.user_id, "Refused to deactivate a super owner");
            return Err(AppError::permission("deactivate a super owner account"));
        }

        user.is_active = !user.is_active;
        let user = users.update(user).await?;

        if user.is_active {
            if let Some(mut profile) = users.find_profile(id).await? {
                if !profile.is_account_active {
                    profile.activate(Some(actor.user_id), Utc::now());
                    users.save_profile(profile).await?;
                }
            }
        }

        tracing::info!(user_id = %user.id, active = user.is_active, by = %actor.user_id, "User status toggled");
        Ok(UserResponse::from(user))
    }

    async fn list_super_owners(&self, actor: &SuperOwner) -> AppResult<Vec<SuperOwnerView>> {
        ensure_flag(actor, SuperOwnerPermission::AccessAdmin)?;
        let owners = self.uow.super_owners().list().await?;
        let users = self
            .uow
            .users()
            .find_by_ids(owners.iter().map(|o| o.user_id).collect())
            .await?;

        Ok(owners
            .into_iter()
            .map(|owner| SuperOwnerView {
                title: owner.display_title(),
                user: users
                    .iter()
                    .find(|u| u.id == owner.user_id)
                    .cloned()
                    .map(UserResponse::from),
                owner,
            })
            .collect())
    }

    async fn create_super_owner(
        &self,
        actor: &SuperOwner,
        request: NewSuperOwnerRequest,
    ) -> AppResult<SuperOwner> {
        ensure_flag(actor, SuperOwnerPermission::DelegatePermissions)?;

        let user = self
            .uow
            .users()
            .find_by_id(request.user_id)
            .await?
            .ok_or_not_found()?;
        if self.uow.super_owners().find_by_user(user.id).await?.is_some() {
            return Err(AppError::conflict("A super owner for this user"));
        }

        let owner = SuperOwner::delegated(
            user.id,
            request.delegation_level,
            request.flags,
            request.allowed_company_ids,
            Some(actor.user_id),
        );
        check_delegation(actor, &owner)?;

        let owner = self.uow.super_owners().create(owner).await?;
        tracing::info!(
            user_id = %owner.user_id,
            level = %owner.delegation_level,
            by = %actor.user_id,
            "Super owner created"
        );
        Ok(owner)
    }

    async fn system_analytics(&self, actor: &SuperOwner) -> AppResult<SystemAnalytics> {
        ensure_flag(actor, SuperOwnerPermission::ViewSystemAnalytics)?;
        let users = self.uow.users();
        let companies = self.uow.companies();
        let projects = self.uow.projects();

        let (total_users, active_users, total_companies, active_companies) = parallel::join4(
            users.count(false),
            users.count(true),
            companies.count(false),
            companies.count(true),
        )
        .await?;
        let (total_projects, active_projects, total_expenses, by_status) = parallel::join4(
            projects.count(None, false),
            projects.count(None, true),
            self.uow.expenses().total_actual(None),
            self.uow.registrations().count_by_status(),
        )
        .await?;

        let requests_by_status: Vec<RequestStatusCount> = RequestStatus::ALL
            .iter()
            .map(|status| RequestStatusCount {
                status: *status,
                count: by_status
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, count)| *count),
            })
            .collect();
        let pending_requests = requests_by_status
            .iter()
            .filter(|c| c.status.is_open())
            .map(|c| c.count)
            .sum();

        Ok(SystemAnalytics {
            total_users,
            active_users,
            total_companies,
            active_companies,
            total_projects,
            active_projects,
            total_expenses,
            pending_requests,
            requests_by_status,
        })
    }

    async fn export(&self, actor: &SuperOwner, kind: ExportKind) -> AppResult<CsvExport> {
        ensure_flag(actor, SuperOwnerPermission::ViewSystemAnalytics)?;
        let bytes = match kind {
            ExportKind::Companies => self.export_companies(actor).await?,
            ExportKind::Users => self.export_users().await?,
            ExportKind::Requests => self.export_requests().await?,
        };

        tracing::info!(kind = ?kind, bytes = bytes.len(), by = %actor.user_id, "Data exported");
        Ok(CsvExport {
            filename: kind.filename(),
            bytes,
        })
    }

    async fn bootstrap_primary_owner(
        &self,
        username: String,
        email: String,
        password: String,
    ) -> AppResult<SuperOwner> {
        let users = self.uow.users();
        let owners = self.uow.super_owners();
        let email = email.trim().to_lowercase();

        let user = match users.find_by_login(&username).await? {
            Some(user) => user,
            None => {
                if users.exists(&username, &email).await? {
                    return Err(AppError::conflict("A user with this email"));
                }
                let user = users
                    .create(NewUser {
                        username: username.trim().to_string(),
                        email,
                        password_hash: Password::new(&password)?.into_string(),
                        first_name: String::new(),
                        last_name: String::new(),
                        is_active: true,
                        is_staff: true,
                    })
                    .await?;
                let mut profile = UserProfile::new(user.id, AccountType::Individual);
                profile.activate(None, Utc::now());
                users.save_profile(profile).await?;
                user
            }
        };

        if let Some(primary) = owners.find_primary().await? {
            if primary.user_id != user.id {
                return Err(AppError::conflict("A primary owner"));
            }
            return Ok(primary);
        }

        let owner = match owners.find_by_user(user.id).await? {
            Some(existing) => owners.update(existing.into_primary()).await?,
            None => owners.create(SuperOwner::primary(user.id)).await?,
        };

        tracing::info!(user_id = %user.id, username = %user.username, "Primary owner ready");
        Ok(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_flag() {
        let primary = SuperOwner::primary(Uuid::new_v4());
        assert!(ensure_flag(&primary, SuperOwnerPermission::ManageBilling).is_ok());

        let read_only =
            SuperOwner::delegated(Uuid::new_v4(), DelegationLevel::ReadOnly, None, vec![], None);
        let err = ensure_flag(&read_only, SuperOwnerPermission::ManageUsers).unwrap_err();
        assert!(matches!(err, AppError::PermissionDenied(_)));
    }

    #[test]
    fn test_export_kind_parsing() {
        assert_eq!("users".parse::<ExportKind>().unwrap(), ExportKind::Users);
        assert_eq!(ExportKind::Requests.filename(), "registration_requests.csv");
        assert!(matches!(
            "projects".parse::<ExportKind>().unwrap_err(),
            AppError::Validation(_)
        ));
    }

    #[test]
    fn test_csv_fields_are_quoted() {
        let bytes = write_csv(
            &["Name", "Notes"],
            vec![vec!["Acme, Ltd".to_string(), or_dash(Some("  "))]],
        )
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert_eq!(text, "Name,Notes\n\"Acme, Ltd\",-\n");
    }

    #[test]
    fn test_delegation_cannot_exceed_delegator() {
        let company = Uuid::new_v4();
        let actor = SuperOwner::delegated(
            Uuid::new_v4(),
            DelegationLevel::UserManagement,
            None,
            vec![company],
            None,
        );

        let wider = SuperOwner::delegated(Uuid::new_v4(), DelegationLevel::Full, None, vec![company], None);
        assert!(check_delegation(&actor, &wider).is_err());

        let unscoped = SuperOwner::delegated(
            Uuid::new_v4(),
            DelegationLevel::UserManagement,
            None,
            vec![],
            None,
        );
        assert!(check_delegation(&actor, &unscoped).is_err());

        let same = SuperOwner::delegated(
            Uuid::new_v4(),
            DelegationLevel::UserManagement,
            None,
            vec![company],
            None,
        );
        assert!(check_delegation(&actor, &same).is_ok());
    }
}
