//! Registration workflow - submission, review and approval of account requests.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::notifications::{messages, Notifier};
use super::super_owner_service::ensure_flag;
use crate::config::{Config, MAX_BULK_ACTION_SIZE};
use crate::domain::{
    generate_temp_password, Applicant, ClientMeta, Company, CompanyDetails, Document, Membership,
    NewUser, Password, RegistrationRequest, RequestMetadata, RequestStatus, RequestType, Role,
    SuperOwner, SuperOwnerPermission, UserResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::cache::with_lock;
use crate::infra::{CacheStore, ProvisionedAccount, UnitOfWork};
use crate::jobs::EmailJob;
use crate::types::{Paginated, PaginationParams, RequestFilter};

static USERNAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9@.+_-]+$").unwrap());

const SOURCE_WEB: &str = "web";

/// Company registration form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CompanyRegistrationForm {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "owner@acme.com")]
    pub email: String,
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    #[schema(example = "acme_owner")]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone: Option<String>,
    #[validate(length(min = 2, max = 200, message = "Company name must be 2-200 characters"))]
    #[schema(example = "Acme Builders Ltd")]
    pub company_name: String,
    pub company_description: Option<String>,
    #[validate(url(message = "Invalid website URL"))]
    pub company_website: Option<String>,
    pub company_address: Option<String>,
    #[validate(length(max = 100, message = "Registration number is too long"))]
    pub company_registration_number: Option<String>,
}

/// Individual registration form
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct IndividualRegistrationForm {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[validate(length(min = 3, max = 150, message = "Username must be 3-150 characters"))]
    #[schema(example = "jane")]
    pub username: String,
    #[validate(length(min = 1, max = 150, message = "First name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 150, message = "Last name is required"))]
    pub last_name: String,
    #[validate(length(max = 20, message = "Phone number is too long"))]
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
}

/// Returned to the applicant after submitting
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    pub request_id: Uuid,
    pub status: RequestStatus,
    /// Secret for the public status page; also sent by email
    pub activation_token: String,
    pub status_url: String,
    pub expires_at: chrono::DateTime<Utc>,
}

/// A request with its uploaded documents
#[derive(Debug, Serialize, ToSchema)]
pub struct RegistrationDetail {
    pub request: RegistrationRequest,
    pub documents: Vec<Document>,
    pub is_expired: bool,
}

/// Everything created by an approval, as returned to the reviewer
#[derive(Debug, Serialize, ToSchema)]
pub struct ApprovalOutcome {
    pub request: RegistrationRequest,
    pub user: UserResponse,
    pub company: Option<Company>,
    pub roles: Vec<Role>,
    pub membership: Option<Membership>,
}

impl From<ProvisionedAccount> for ApprovalOutcome {
    fn from(account: ProvisionedAccount) -> Self {
        Self {
            request: account.request,
            user: UserResponse::from(account.user),
            company: account.company,
            roles: account.roles,
            membership: account.membership,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BulkAction {
    Approve,
    Reject,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BulkActionRequest {
    #[validate(length(min = 1, message = "Select at least one request"))]
    pub ids: Vec<Uuid>,
    pub action: BulkAction,
    /// Required when rejecting
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkFailure {
    pub id: Uuid,
    pub code: String,
    pub message: String,
}

/// Per-request outcome of a bulk action
#[derive(Debug, Default, Serialize, ToSchema)]
pub struct BulkActionReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

#[async_trait]
pub trait RegistrationService: Send + Sync {
    async fn submit_company(
        &self,
        form: CompanyRegistrationForm,
        client: ClientMeta,
    ) -> AppResult<SubmissionReceipt>;

    async fn submit_individual(
        &self,
        form: IndividualRegistrationForm,
        client: ClientMeta,
    ) -> AppResult<SubmissionReceipt>;

    /// Public status lookup by activation token
    async fn status(&self, token: &str) -> AppResult<RegistrationDetail>;

    /// Applicant sends the request back for review after adding documents
    async fn resubmit(&self, token: &str) -> AppResult<RegistrationRequest>;

    async fn list(
        &self,
        actor: &SuperOwner,
        filter: RequestFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<RegistrationRequest>>;

    async fn get(&self, actor: &SuperOwner, id: Uuid) -> AppResult<RegistrationDetail>;

    async fn mark_under_review(&self, actor: &SuperOwner, id: Uuid)
        -> AppResult<RegistrationRequest>;

    async fn require_documents(
        &self,
        actor: &SuperOwner,
        id: Uuid,
        message: Option<String>,
    ) -> AppResult<RegistrationRequest>;

    async fn approve(&self, actor: &SuperOwner, id: Uuid) -> AppResult<ApprovalOutcome>;

    async fn reject(
        &self,
        actor: &SuperOwner,
        id: Uuid,
        reason: String,
    ) -> AppResult<RegistrationRequest>;

    async fn bulk_action(
        &self,
        actor: &SuperOwner,
        request: BulkActionRequest,
    ) -> AppResult<BulkActionReport>;

    /// Expire every open request past its deadline, returning how many changed
    async fn expire_stale(&self) -> AppResult<u64>;
}

fn lock_resource(id: Uuid) -> String {
    format!("registration:{}", id)
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_username(username: &str) -> AppResult<()> {
    if USERNAME.is_match(username.trim()) {
        Ok(())
    } else {
        Err(AppError::validation(
            "Username may only contain letters, digits and @/./+/-/_",
        ))
    }
}

pub struct RegistrationManager<U: UnitOfWork> {
    uow: Arc<U>,
    cache: Arc<dyn CacheStore>,
    notifier: Notifier,
    config: Config,
}

impl<U: UnitOfWork> RegistrationManager<U> {
    pub fn new(
        uow: Arc<U>,
        cache: Arc<dyn CacheStore>,
        notifier: Notifier,
        config: Config,
    ) -> Self {
        Self {
            uow,
            cache,
            notifier,
            config,
        }
    }

    fn status_link(&self, request: &RegistrationRequest) -> String {
        self.config
            .site_link(&format!("/registration/status/{}", request.activation_token))
    }

    async fn ensure_available(&self, username: &str, email: &str) -> AppResult<()> {
        if self.uow.users().exists(username, email).await? {
            return Err(AppError::conflict("An account with this username or email"));
        }
        if self.uow.registrations().has_open_request(email).await? {
            return Err(AppError::conflict(
                "An open registration request for this email",
            ));
        }
        Ok(())
    }

    /// Email addresses of every super owner allowed to activate accounts
    async fn activator_emails(&self) -> AppResult<Vec<String>> {
        let owners = self.uow.super_owners().list().await?;
        let ids: Vec<Uuid> = owners
            .iter()
            .filter(|o| o.has(SuperOwnerPermission::ActivateAccounts))
            .map(|o| o.user_id)
            .collect();
        let users = self.uow.users().find_by_ids(ids).await?;
        Ok(users
            .into_iter()
            .filter(|u| u.is_active)
            .map(|u| u.email)
            .collect())
    }

    async fn alert_activators(&self, request: &RegistrationRequest) {
        let recipients = match self.activator_emails().await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::warn!(request_id = %request.id, error = %e, "Could not load super owners to notify");
                return;
            }
        };
        let review_link = self
            .config
            .site_link(&format!("/super-owner/registrations/{}", request.id));
        let emails: Vec<EmailJob> = recipients
            .iter()
            .map(|to| messages::registration_alert(request, to, &review_link))
            .collect();
        self.notifier.deliver_all(emails).await;
    }

    async fn create_request(
        &self,
        request_type: RequestType,
        applicant: Applicant,
        company: Option<CompanyDetails>,
        metadata: RequestMetadata,
    ) -> AppResult<SubmissionReceipt> {
        check_username(&applicant.username)?;
        self.ensure_available(&applicant.username, &applicant.email)
            .await?;

        let request = RegistrationRequest::new(
            request_type,
            applicant,
            company,
            metadata,
            self.config.registration_expiry_days,
            Utc::now(),
        );
        let request = self.uow.registrations().create(request).await?;

        tracing::info!(
            request_id = %request.id,
            request_type = %request.request_type,
            email = %request.email,
            "Registration request submitted"
        );

        let status_url = self.status_link(&request);
        self.notifier
            .deliver(messages::registration_received(&request, &status_url))
            .await;
        self.alert_activators(&request).await;

        Ok(SubmissionReceipt {
            request_id: request.id,
            status: request.status,
            activation_token: request.activation_token.clone(),
            status_url,
            expires_at: request.expires_at,
        })
    }

    async fn load(&self, id: Uuid) -> AppResult<RegistrationRequest> {
        self.uow
            .registrations()
            .find_by_id(id)
            .await?
            .ok_or_not_found()
    }

    async fn detail(&self, request: RegistrationRequest) -> AppResult<RegistrationDetail> {
        let documents = self.uow.documents().list_for_request(request.id).await?;
        Ok(RegistrationDetail {
            is_expired: request.is_expired(Utc::now()),
            request,
            documents,
        })
    }

    /// Transition and provision under the request lock
    async fn provision(&self, approver: Uuid, id: Uuid) -> AppResult<(ProvisionedAccount, String)> {
        let registrations = self.uow.registrations();
        let mut request = self.load(id).await?;

        if let Err(e) = request.approve(approver, Utc::now()) {
            if matches!(e, AppError::RequestExpired) {
                registrations.update(request).await?;
                tracing::info!(request_id = %id, "Approval refused, request expired");
            }
            return Err(e);
        }

        if self
            .uow
            .users()
            .exists(&request.username, &request.email)
            .await?
        {
            return Err(AppError::conflict("An account with this username or email"));
        }

        let temp_password = generate_temp_password();
        let account = NewUser {
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: Password::new(&temp_password)?.into_string(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            is_active: true,
            is_staff: false,
        };

        let provisioned = self
            .uow
            .provisioning()
            .provision_registration(request, account)
            .await?;
        Ok((provisioned, temp_password))
    }

    async fn decide_reject(
        &self,
        reviewer: Uuid,
        id: Uuid,
        reason: String,
    ) -> AppResult<RegistrationRequest> {
        let mut request = self.load(id).await?;
        request.reject(reviewer, reason.trim().to_string(), Utc::now())?;
        self.uow.registrations().update(request).await
    }
}

#[async_trait]
impl<U: UnitOfWork> RegistrationService for RegistrationManager<U> {
    async fn submit_company(
        &self,
        form: CompanyRegistrationForm,
        client: ClientMeta,
    ) -> AppResult<SubmissionReceipt> {
        let applicant = Applicant {
            email: form.email,
            username: form.username,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: trimmed(form.phone),
        };
        let company = CompanyDetails {
            name: form.company_name.trim().to_string(),
            description: trimmed(form.company_description),
            website: trimmed(form.company_website),
            address: trimmed(form.company_address),
            registration_number: trimmed(form.company_registration_number),
        };

        self.create_request(
            RequestType::CompanyRegistration,
            applicant,
            Some(company),
            RequestMetadata::from_client(SOURCE_WEB, &client),
        )
        .await
    }

    async fn submit_individual(
        &self,
        form: IndividualRegistrationForm,
        client: ClientMeta,
    ) -> AppResult<SubmissionReceipt> {
        if let Some(dob) = form.date_of_birth {
            if dob >= Utc::now().date_naive() {
                return Err(AppError::validation("Date of birth must be in the past"));
            }
        }

        let applicant = Applicant {
            email: form.email,
            username: form.username,
            first_name: form.first_name.trim().to_string(),
            last_name: form.last_name.trim().to_string(),
            phone: trimmed(form.phone),
        };
        let mut metadata = RequestMetadata::from_client(SOURCE_WEB, &client);
        metadata.address = trimmed(form.address);
        metadata.date_of_birth = form.date_of_birth;

        self.create_request(RequestType::IndividualRegistration, applicant, None, metadata)
            .await
    }

    async fn status(&self, token: &str) -> AppResult<RegistrationDetail> {
        let request = self
            .uow
            .registrations()
            .find_by_token(token)
            .await?
            .ok_or_not_found()?;
        self.detail(request).await
    }

    async fn resubmit(&self, token: &str) -> AppResult<RegistrationRequest> {
        let registrations = self.uow.registrations();
        let mut request = registrations
            .find_by_token(token)
            .await?
            .ok_or_not_found()?;

        request.resubmit(Utc::now())?;
        let request = registrations.update(request).await?;

        tracing::info!(request_id = %request.id, "Registration request resubmitted");
        self.alert_activators(&request).await;
        Ok(request)
    }

    async fn list(
        &self,
        actor: &SuperOwner,
        filter: RequestFilter,
        params: PaginationParams,
    ) -> AppResult<Paginated<RegistrationRequest>> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        let page = self.uow.registrations().list(&filter, &params).await?;
        Ok(Paginated::from_page(page, &params))
    }

    async fn get(&self, actor: &SuperOwner, id: Uuid) -> AppResult<RegistrationDetail> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        let request = self.load(id).await?;
        self.detail(request).await
    }

    async fn mark_under_review(
        &self,
        actor: &SuperOwner,
        id: Uuid,
    ) -> AppResult<RegistrationRequest> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;

        let request = with_lock(self.cache.as_ref(), &lock_resource(id), async {
            let mut request = self.load(id).await?;
            request.mark_under_review(actor.user_id, Utc::now())?;
            self.uow.registrations().update(request).await
        })
        .await?;

        tracing::info!(request_id = %id, reviewer = %actor.user_id, "Registration under review");
        self.notifier.deliver(messages::under_review(&request)).await;
        Ok(request)
    }

    async fn require_documents(
        &self,
        actor: &SuperOwner,
        id: Uuid,
        message: Option<String>,
    ) -> AppResult<RegistrationRequest> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;
        let message = trimmed(message);

        let request = with_lock(self.cache.as_ref(), &lock_resource(id), async {
            let mut request = self.load(id).await?;
            request.require_documents(actor.user_id, message.clone(), Utc::now())?;
            self.uow.registrations().update(request).await
        })
        .await?;

        tracing::info!(request_id = %id, reviewer = %actor.user_id, "Documents requested");
        let status_link = self.status_link(&request);
        self.notifier
            .deliver(messages::documents_required(
                &request,
                message.as_deref(),
                &status_link,
            ))
            .await;
        Ok(request)
    }

    async fn approve(&self, actor: &SuperOwner, id: Uuid) -> AppResult<ApprovalOutcome> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;

        let (provisioned, temp_password) = with_lock(
            self.cache.as_ref(),
            &lock_resource(id),
            self.provision(actor.user_id, id),
        )
        .await?;

        tracing::info!(
            request_id = %id,
            approver = %actor.user_id,
            user_id = %provisioned.user.id,
            "Registration approved"
        );

        let login_link = self.config.site_link("/auth/login");
        self.notifier
            .deliver(messages::registration_approved(
                &provisioned.request,
                &provisioned.user,
                &temp_password,
                &login_link,
            ))
            .await;

        Ok(ApprovalOutcome::from(provisioned))
    }

    async fn reject(
        &self,
        actor: &SuperOwner,
        id: Uuid,
        reason: String,
    ) -> AppResult<RegistrationRequest> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;

        let request = with_lock(
            self.cache.as_ref(),
            &lock_resource(id),
            self.decide_reject(actor.user_id, id, reason),
        )
        .await?;

        tracing::info!(request_id = %id, reviewer = %actor.user_id, "Registration rejected");
        let reason = request.rejection_reason.clone().unwrap_or_default();
        self.notifier
            .deliver(messages::registration_rejected(&request, &reason))
            .await;
        Ok(request)
    }

    async fn bulk_action(
        &self,
        actor: &SuperOwner,
        request: BulkActionRequest,
    ) -> AppResult<BulkActionReport> {
        ensure_flag(actor, SuperOwnerPermission::ActivateAccounts)?;

        if request.ids.len() > MAX_BULK_ACTION_SIZE {
            return Err(AppError::validation(format!(
                "At most {} requests can be processed at once",
                MAX_BULK_ACTION_SIZE
            )));
        }
        let reason = trimmed(request.reason);
        if request.action == BulkAction::Reject && reason.is_none() {
            return Err(AppError::validation("A rejection reason is required"));
        }

        let mut seen = HashSet::new();
        let mut ids = request.ids;
        ids.retain(|id| seen.insert(*id));

        let mut report = BulkActionReport::default();
        for id in ids {
            let result = match request.action {
                BulkAction::Approve => self.approve(actor, id).await.map(|_| ()),
                BulkAction::Reject => self
                    .reject(actor, id, reason.clone().unwrap_or_default())
                    .await
                    .map(|_| ()),
            };
            match result {
                Ok(()) => report.succeeded.push(id),
                Err(e) => report.failed.push(BulkFailure {
                    id,
                    code: e.code().to_string(),
                    message: e.user_message(),
                }),
            }
        }

        tracing::info!(
            action = ?request.action,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk registration action finished"
        );
        Ok(report)
    }

    async fn expire_stale(&self) -> AppResult<u64> {
        let registrations = self.uow.registrations();
        let now = Utc::now();
        let mut expired = 0;

        for mut request in registrations.list_expired_open(now).await? {
            if request.expire(now) {
                registrations.update(request).await?;
                expired += 1;
            }
        }

        tracing::info!(count = expired, "Expired stale registration requests");
        Ok(expired)
    }
}
