//! Atomic account provisioning.
//!
//! Approving a registration creates the user, the profile and, for
//! company registrations, the company with its default roles and the
//! admin membership. Either all of it is committed or none of it.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::domain::{
    default_roles, slugify, unique_slug, AccountType, Company, Membership, NewCompany, NewUser,
    RegistrationRequest, RequestStatus, Role, User, UserProfile,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::with_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Everything created by an approval
#[derive(Debug, Clone)]
pub struct ProvisionedAccount {
    pub request: RegistrationRequest,
    pub user: User,
    pub profile: UserProfile,
    pub company: Option<Company>,
    pub roles: Vec<Role>,
    pub membership: Option<Membership>,
}

/// Membership to create together with a new member account
#[derive(Debug, Clone)]
pub struct MemberGrant {
    pub company_id: Uuid,
    pub role_id: Uuid,
    pub invited_by: Uuid,
}

#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait AccountProvisioner: Send + Sync {
    /// Persist an approved request and create its accounts in one transaction.
    ///
    /// Fails with a transition error when the stored request is no longer
    /// awaiting a decision.
    async fn provision_registration(
        &self,
        approved: RegistrationRequest,
        account: NewUser,
    ) -> AppResult<ProvisionedAccount>;

    /// Create an active member account with its membership.
    async fn create_member_account(
        &self,
        account: NewUser,
        grant: MemberGrant,
    ) -> AppResult<(User, Membership)>;
}

pub struct ProvisioningStore {
    db: DatabaseConnection,
}

impl ProvisioningStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountProvisioner for ProvisioningStore {
    async fn provision_registration(
        &self,
        approved: RegistrationRequest,
        account: NewUser,
    ) -> AppResult<ProvisionedAccount> {
        with_transaction!(&self.db, |ctx| {
            let current = ctx
                .registrations()
                .find_for_update(approved.id)
                .await?
                .ok_or_not_found()?;
            if !matches!(
                current.status,
                RequestStatus::Pending | RequestStatus::UnderReview
            ) {
                return Err(AppError::transition("approve", current.status));
            }

            let now = Utc::now();
            let user = ctx.users().create(account).await?;
            let account_type = if approved.is_company() {
                AccountType::CompanyAdmin
            } else {
                AccountType::Individual
            };
            let mut profile = UserProfile::new(user.id, account_type);
            profile.phone = approved.phone.clone();
            profile.address = approved.metadata.address.clone();
            profile.activate(approved.reviewed_by, now);

            let mut company = None;
            let mut roles = Vec::new();
            let mut membership = None;

            if approved.is_company() {
                let name = approved
                    .company_name
                    .clone()
                    .ok_or_else(|| AppError::validation("Company name is missing"))?;
                let base = slugify(&name);
                let taken = ctx.companies().slugs_like(&base).await?;

                let created = ctx
                    .companies()
                    .create(NewCompany {
                        slug: unique_slug(&base, &taken),
                        name,
                        description: approved.company_description.clone(),
                        email: Some(approved.email.clone()),
                        phone: approved.phone.clone(),
                        address: approved.company_address.clone(),
                        website: approved.company_website.clone(),
                        registration_number: approved.company_registration_number.clone(),
                    })
                    .await?;

                for template in default_roles() {
                    roles.push(ctx.access().create_role(template.into_role(created.id)).await?);
                }
                // default_roles() lists the admin role first
                let admin_role = roles
                    .first()
                    .ok_or_else(|| AppError::internal("No default roles defined"))?;
                membership = Some(
                    ctx.access()
                        .create_membership(Membership::new(
                            user.id,
                            created.id,
                            admin_role.id,
                            approved.reviewed_by,
                        ))
                        .await?,
                );
                profile.last_company_id = Some(created.id);
                company = Some(created);
            }

            let profile = ctx.users().create_profile(profile).await?;

            let mut request = approved;
            request.provisioned_user_id = Some(user.id);
            let request = ctx.registrations().update(request).await?;

            tracing::info!(
                request_id = %request.id,
                user_id = %user.id,
                company_id = ?company.as_ref().map(|c| c.id),
                "Registration provisioned"
            );

            Ok(ProvisionedAccount {
                request,
                user,
                profile,
                company,
                roles,
                membership,
            })
        })
    }

    async fn create_member_account(
        &self,
        account: NewUser,
        grant: MemberGrant,
    ) -> AppResult<(User, Membership)> {
        with_transaction!(&self.db, |ctx| {
            let user = ctx.users().create(account).await?;

            let mut profile = UserProfile::new(user.id, AccountType::CompanyMember);
            profile.activate(Some(grant.invited_by), Utc::now());
            profile.last_company_id = Some(grant.company_id);
            ctx.users().create_profile(profile).await?;

            let membership = ctx
                .access()
                .create_membership(Membership::new(
                    user.id,
                    grant.company_id,
                    grant.role_id,
                    Some(grant.invited_by),
                ))
                .await?;

            Ok((user, membership))
        })
    }
}
