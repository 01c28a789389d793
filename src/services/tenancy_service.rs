//! Tenancy - the company a user works in, its roles and its members.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::notification_service::NotificationCenter;
use super::notifications::{messages, Notifier};
use crate::config::Config;
use crate::domain::{
    choose_membership, generate_temp_password, AccountType, Action, Company, Membership,
    MembershipStatus, NewUser, Password, Permission, Resource, Role, RoleTemplate, TenantContext,
    User, UserProfile, UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::{MemberGrant, UnitOfWork};

/// One company the caller belongs to
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanySummary {
    pub company: Company,
    pub role_name: String,
    pub status: MembershipStatus,
    pub is_current: bool,
}

/// A member with their account and role
#[derive(Debug, Serialize, ToSchema)]
pub struct MemberView {
    pub membership: Membership,
    pub user: UserResponse,
    pub role_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RoleInput {
    #[validate(length(min = 1, max = 100, message = "Role name is required (max 100 characters)"))]
    #[schema(example = "Site Engineer")]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_supervisor: bool,
    #[serde(default)]
    pub is_team_member: bool,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct InviteMemberRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub role_id: Uuid,
    /// Used when a new account has to be created
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct MemberUpdate {
    pub role_id: Option<Uuid>,
    pub status: Option<MembershipStatus>,
}

#[async_trait]
pub trait TenancyService: Send + Sync {
    /// Company context for a user's request
    async fn resolve(&self, user_id: Uuid) -> AppResult<TenantContext>;

    async fn switch_company(&self, user_id: Uuid, company_id: Uuid) -> AppResult<TenantContext>;

    async fn my_companies(&self, user_id: Uuid) -> AppResult<Vec<CompanySummary>>;

    async fn list_roles(&self, ctx: &TenantContext) -> AppResult<Vec<Role>>;

    async fn create_role(&self, ctx: &TenantContext, input: RoleInput) -> AppResult<Role>;

    async fn update_role(&self, ctx: &TenantContext, id: Uuid, input: RoleInput)
        -> AppResult<Role>;

    async fn delete_role(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()>;

    async fn list_members(&self, ctx: &TenantContext) -> AppResult<Vec<MemberView>>;

    async fn invite_member(
        &self,
        ctx: &TenantContext,
        request: InviteMemberRequest,
    ) -> AppResult<MemberView>;

    async fn update_member(
        &self,
        ctx: &TenantContext,
        membership_id: Uuid,
        update: MemberUpdate,
    ) -> AppResult<MemberView>;
}

/// Username for an invited account: the requested one or the email's local part
fn invited_username(request: &InviteMemberRequest) -> String {
    request
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            request
                .email
                .split('@')
                .next()
                .unwrap_or_default()
                .to_lowercase()
        })
}

fn member_view(membership: Membership, user: User, role: Option<&Role>) -> MemberView {
    MemberView {
        membership,
        user: UserResponse::from(user),
        role_name: role.map(|r| r.name.clone()).unwrap_or_default(),
    }
}

pub struct TenantManager<U: UnitOfWork> {
    uow: Arc<U>,
    notifier: Notifier,
    alerts: NotificationCenter<U>,
    config: Config,
}

impl<U: UnitOfWork> TenantManager<U> {
    pub fn new(uow: Arc<U>, notifier: Notifier, config: Config) -> Self {
        Self {
            alerts: NotificationCenter::new(uow.clone(), notifier.clone()),
            uow,
            notifier,
            config,
        }
    }

    async fn context_for(&self, user_id: Uuid, membership: Membership) -> AppResult<TenantContext> {
        let company = self
            .uow
            .companies()
            .find_by_id(membership.company_id)
            .await?
            .ok_or(AppError::NoCompany)?;
        if !company.is_active {
            return Err(AppError::permission("work in a deactivated company"));
        }
        let role = self
            .uow
            .access()
            .find_role(company.id, membership.role_id)
            .await?
            .ok_or_else(|| AppError::internal("Membership points at a missing role"))?;

        Ok(TenantContext {
            user_id,
            company,
            membership,
            role,
        })
    }

    async fn load_role(&self, ctx: &TenantContext, id: Uuid) -> AppResult<Role> {
        self.uow
            .access()
            .find_role(ctx.company_id(), id)
            .await?
            .ok_or_not_found()
    }

    /// Whether any active member other than `excluding` holds an admin role
    async fn has_other_admin(&self, ctx: &TenantContext, excluding: Uuid) -> AppResult<bool> {
        let roles = self.uow.access().list_roles(ctx.company_id()).await?;
        let members = self.uow.access().list_members(ctx.company_id()).await?;
        Ok(members.iter().any(|m| {
            m.id != excluding
                && m.is_active()
                && roles.iter().any(|r| r.id == m.role_id && r.is_admin)
        }))
    }

    async fn unique_username(&self, base: &str, email: &str) -> AppResult<String> {
        let users = self.uow.users();
        if !users.exists(base, email).await? {
            return Ok(base.to_string());
        }
        for _ in 0..5 {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("{}-{}", base, &suffix[..4]);
            if !users.exists(&candidate, email).await? {
                return Ok(candidate);
            }
        }
        Err(AppError::conflict("A user with this username"))
    }

    async fn invite_link_email(&self, ctx: &TenantContext, user: &User, temp_password: Option<&str>) {
        let login_link = self.config.site_link("/auth/login");
        self.notifier
            .deliver(messages::member_invited(
                user,
                &ctx.company.name,
                temp_password,
                &login_link,
            ))
            .await;
    }
}

#[async_trait]
impl<U: UnitOfWork> TenancyService for TenantManager<U> {
    async fn resolve(&self, user_id: Uuid) -> AppResult<TenantContext> {
        let memberships = self.uow.access().memberships_for_user(user_id).await?;
        let last_company = self
            .uow
            .users()
            .find_profile(user_id)
            .await?
            .and_then(|p| p.last_company_id);

        let membership = choose_membership(&memberships, last_company)
            .cloned()
            .ok_or(AppError::NoCompany)?;
        self.context_for(user_id, membership).await
    }

    async fn switch_company(&self, user_id: Uuid, company_id: Uuid) -> AppResult<TenantContext> {
        let membership = self
            .uow
            .access()
            .find_membership(user_id, company_id)
            .await?
            .filter(Membership::is_active)
            .ok_or_else(|| AppError::permission("switch to this company"))?;
        let ctx = self.context_for(user_id, membership).await?;

        let users = self.uow.users();
        let mut profile = match users.find_profile(user_id).await? {
            Some(profile) => profile,
            None => {
                // No profile means the account was never gated; keep it usable
                let mut profile = UserProfile::new(user_id, AccountType::CompanyMember);
                profile.activate(None, Utc::now());
                profile
            }
        };
        profile.last_company_id = Some(company_id);
        users.save_profile(profile).await?;

        tracing::info!(user_id = %user_id, company_id = %company_id, "Switched company");
        Ok(ctx)
    }

    async fn my_companies(&self, user_id: Uuid) -> AppResult<Vec<CompanySummary>> {
        let access = self.uow.access();
        let memberships = access.memberships_for_user(user_id).await?;
        let last_company = self
            .uow
            .users()
            .find_profile(user_id)
            .await?
            .and_then(|p| p.last_company_id);
        let current = choose_membership(&memberships, last_company).map(|m| m.company_id);

        let companies = self
            .uow
            .companies()
            .find_by_ids(memberships.iter().map(|m| m.company_id).collect())
            .await?;

        let mut summaries = Vec::with_capacity(memberships.len());
        for membership in memberships {
            let Some(company) = companies.iter().find(|c| c.id == membership.company_id) else {
                continue;
            };
            let role_name = access
                .find_role(company.id, membership.role_id)
                .await?
                .map(|r| r.name)
                .unwrap_or_default();
            summaries.push(CompanySummary {
                is_current: current == Some(company.id),
                company: company.clone(),
                role_name,
                status: membership.status,
            });
        }
        Ok(summaries)
    }

    async fn list_roles(&self, ctx: &TenantContext) -> AppResult<Vec<Role>> {
        ctx.require(Resource::Users, Action::View)?;
        self.uow.access().list_roles(ctx.company_id()).await
    }

    async fn create_role(&self, ctx: &TenantContext, input: RoleInput) -> AppResult<Role> {
        ctx.require(Resource::Users, Action::Edit)?;
        if input.is_admin {
            ctx.require_admin()?;
        }
        ctx.require_grantable(&input.permissions)?;

        let name = input.name.trim().to_string();
        let access = self.uow.access();
        if access.role_name_taken(ctx.company_id(), &name, None).await? {
            return Err(AppError::conflict("A role with this name"));
        }

        let role = RoleTemplate {
            name,
            description: input.description,
            is_admin: input.is_admin,
            is_supervisor: input.is_supervisor,
            is_team_member: input.is_team_member,
            permissions: input.permissions,
        }
        .into_role(ctx.company_id());
        let role = access.create_role(role).await?;

        tracing::info!(company_id = %ctx.company_id(), role_id = %role.id, "Role created");
        Ok(role)
    }

    async fn update_role(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        input: RoleInput,
    ) -> AppResult<Role> {
        ctx.require(Resource::Users, Action::Edit)?;
        let mut role = self.load_role(ctx, id).await?;
        if role.is_admin || input.is_admin {
            ctx.require_admin()?;
        }
        if !ctx.is_admin() {
            if role.id == ctx.role.id {
                return Err(AppError::permission("change your own role"));
            }
            let added: Vec<Permission> = input
                .permissions
                .iter()
                .filter(|p| !role.permissions.contains(p))
                .copied()
                .collect();
            ctx.require_grantable(&added)?;
        }

        let access = self.uow.access();
        if role.is_admin && !input.is_admin {
            let admin_roles = access
                .list_roles(ctx.company_id())
                .await?
                .into_iter()
                .filter(|r| r.is_admin)
                .count();
            if admin_roles <= 1 {
                return Err(AppError::business("The company needs at least one admin role"));
            }
        }

        let name = input.name.trim().to_string();
        if access
            .role_name_taken(ctx.company_id(), &name, Some(id))
            .await?
        {
            return Err(AppError::conflict("A role with this name"));
        }

        role.name = name;
        role.description = input.description;
        role.is_admin = input.is_admin;
        role.is_supervisor = input.is_supervisor;
        role.is_team_member = input.is_team_member;
        role.permissions = input.permissions;
        role.updated_at = Utc::now();
        access.update_role(role).await
    }

    async fn delete_role(&self, ctx: &TenantContext, id: Uuid) -> AppResult<()> {
        ctx.require(Resource::Users, Action::Edit)?;
        let role = self.load_role(ctx, id).await?;
        let access = self.uow.access();

        let assigned = access.count_role_members(id).await?;
        if assigned > 0 {
            return Err(AppError::business(format!(
                "The role is still assigned to {} member(s)",
                assigned
            )));
        }
        if role.is_admin {
            let admin_roles = access
                .list_roles(ctx.company_id())
                .await?
                .into_iter()
                .filter(|r| r.is_admin)
                .count();
            if admin_roles <= 1 {
                return Err(AppError::business("The last admin role cannot be deleted"));
            }
        }

        access.delete_role(id).await?;
        tracing::info!(company_id = %ctx.company_id(), role_id = %id, "Role deleted");
        Ok(())
    }

    async fn list_members(&self, ctx: &TenantContext) -> AppResult<Vec<MemberView>> {
        ctx.require(Resource::Users, Action::View)?;
        let access = self.uow.access();
        let memberships = access.list_members(ctx.company_id()).await?;
        let roles = access.list_roles(ctx.company_id()).await?;
        let users = self
            .uow
            .users()
            .find_by_ids(memberships.iter().map(|m| m.user_id).collect())
            .await?;

        Ok(memberships
            .into_iter()
            .filter_map(|membership| {
                let user = users.iter().find(|u| u.id == membership.user_id)?.clone();
                let role = roles.iter().find(|r| r.id == membership.role_id);
                Some(member_view(membership, user, role))
            })
            .collect())
    }

    async fn invite_member(
        &self,
        ctx: &TenantContext,
        request: InviteMemberRequest,
    ) -> AppResult<MemberView> {
        ctx.require(Resource::Users, Action::Create)?;
        let role = self.load_role(ctx, request.role_id).await?;
        if role.is_admin {
            ctx.require_admin()?;
        }

        let access = self.uow.access();
        let email = request.email.trim().to_lowercase();

        if let Some(user) = self.uow.users().find_by_email(&email).await? {
            let membership = match access.find_membership(user.id, ctx.company_id()).await? {
                Some(existing) if existing.is_active() => {
                    return Err(AppError::conflict("A membership for this user"));
                }
                Some(mut existing) => {
                    existing.status = MembershipStatus::Active;
                    existing.role_id = role.id;
                    existing.invited_by = Some(ctx.user_id);
                    existing.updated_at = Utc::now();
                    access.update_membership(existing).await?
                }
                None => {
                    access
                        .create_membership(Membership::new(
                            user.id,
                            ctx.company_id(),
                            role.id,
                            Some(ctx.user_id),
                        ))
                        .await?
                }
            };

            tracing::info!(company_id = %ctx.company_id(), user_id = %user.id, "Existing user added to company");
            self.invite_link_email(ctx, &user, None).await;
            self.alerts.member_invited(ctx, &membership, &role).await;
            return Ok(member_view(membership, user, Some(&role)));
        }

        let username = self
            .unique_username(&invited_username(&request), &email)
            .await?;
        let temp_password = generate_temp_password();
        let account = NewUser {
            username,
            email,
            password_hash: Password::new(&temp_password)?.into_string(),
            first_name: request.first_name.unwrap_or_default().trim().to_string(),
            last_name: request.last_name.unwrap_or_default().trim().to_string(),
            is_active: true,
            is_staff: false,
        };
        let (user, membership) = self
            .uow
            .provisioning()
            .create_member_account(
                account,
                MemberGrant {
                    company_id: ctx.company_id(),
                    role_id: role.id,
                    invited_by: ctx.user_id,
                },
            )
            .await?;

        tracing::info!(company_id = %ctx.company_id(), user_id = %user.id, "Member account created");
        self.invite_link_email(ctx, &user, Some(&temp_password)).await;
        self.alerts.member_invited(ctx, &membership, &role).await;
        Ok(member_view(membership, user, Some(&role)))
    }

    async fn update_member(
        &self,
        ctx: &TenantContext,
        membership_id: Uuid,
        update: MemberUpdate,
    ) -> AppResult<MemberView> {
        ctx.require(Resource::Users, Action::Edit)?;
        if membership_id == ctx.membership.id {
            return Err(AppError::business("You cannot change your own membership"));
        }

        let access = self.uow.access();
        let mut membership = access
            .find_membership_by_id(ctx.company_id(), membership_id)
            .await?
            .ok_or_not_found()?;
        let current_role = self.load_role(ctx, membership.role_id).await?;

        let new_role = match update.role_id {
            Some(role_id) if role_id != membership.role_id => {
                let role = self.load_role(ctx, role_id).await?;
                if role.is_admin {
                    ctx.require_admin()?;
                }
                Some(role)
            }
            _ => None,
        };
        let new_status = update.status.unwrap_or(membership.status);

        let loses_admin = current_role.is_admin
            && membership.is_active()
            && (new_role.as_ref().map_or(false, |r| !r.is_admin)
                || new_status != MembershipStatus::Active);
        if loses_admin {
            ctx.require_admin()?;
            if !self.has_other_admin(ctx, membership.id).await? {
                return Err(AppError::business("The company needs at least one active admin"));
            }
        }

        if let Some(role) = &new_role {
            membership.role_id = role.id;
        }
        membership.status = new_status;
        membership.updated_at = Utc::now();
        let membership = access.update_membership(membership).await?;

        let user = self
            .uow
            .users()
            .find_by_id(membership.user_id)
            .await?
            .ok_or_not_found()?;
        let role = match new_role {
            Some(role) => {
                self.alerts
                    .role_changed(ctx, &membership, &current_role, &role)
                    .await;
                role
            }
            None => current_role,
        };

        tracing::info!(
            company_id = %ctx.company_id(),
            membership_id = %membership.id,
            status = %membership.status,
            "Membership updated"
        );
        Ok(member_view(membership, user, Some(&role)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invite(email: &str, username: Option<&str>) -> InviteMemberRequest {
        InviteMemberRequest {
            email: email.to_string(),
            role_id: Uuid::new_v4(),
            username: username.map(str::to_string),
            first_name: None,
            last_name: None,
        }
    }

    #[test]
    fn test_invited_username() {
        assert_eq!(invited_username(&invite("Site.Lead@acme.test", None)), "site.lead");
        assert_eq!(invited_username(&invite("x@acme.test", Some(" lead "))), "lead");
        assert_eq!(invited_username(&invite("x@acme.test", Some("  "))), "x");
    }
}
