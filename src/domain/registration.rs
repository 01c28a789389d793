//! Account activation requests and their review state machine.
//!
//! ```text
//! pending ──► under_review ──► documents_required ──► (resubmit) pending
//!    │              │                   │
//!    ├──────────────┴──► approved       └──► rejected
//!    └──────────────────► rejected
//! open + past expiry ──► expired
//! ```
//!
//! Approved, rejected and expired are terminal.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::password::generate_token;
use crate::config::MAX_USER_AGENT_LENGTH;
use crate::errors::{AppError, AppResult};

string_enum!(
    RequestType {
        CompanyRegistration => "company_registration",
        IndividualRegistration => "individual_registration",
        UserInvitation => "user_invitation",
        UserRegistration => "user_registration",
    }
);

string_enum!(
    RequestStatus {
        Pending => "pending",
        UnderReview => "under_review",
        DocumentsRequired => "documents_required",
        Approved => "approved",
        Rejected => "rejected",
        Expired => "expired",
    }
);

impl RequestStatus {
    /// Statuses that still await a decision
    pub const OPEN: &'static [RequestStatus] = &[
        RequestStatus::Pending,
        RequestStatus::UnderReview,
        RequestStatus::DocumentsRequired,
    ];

    pub fn is_open(&self) -> bool {
        Self::OPEN.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_open()
    }
}

/// Who is applying
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Applicant {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Company the applicant wants to register
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CompanyDetails {
    pub name: String,
    pub description: Option<String>,
    pub website: Option<String>,
    pub address: Option<String>,
    pub registration_number: Option<String>,
}

/// Where a request came from
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Free-form request metadata, stored as JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct RequestMetadata {
    pub source: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    /// Individual applicants' postal address
    pub address: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Last message sent to the applicant by a reviewer
    pub review_message: Option<String>,
}

impl RequestMetadata {
    pub fn from_client(source: &str, client: &ClientMeta) -> Self {
        Self {
            source: source.to_string(),
            ip_address: client.ip_address.clone(),
            user_agent: client
                .user_agent
                .as_ref()
                .map(|ua| ua.chars().take(MAX_USER_AGENT_LENGTH).collect()),
            ..Self::default()
        }
    }
}

/// Account activation request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationRequest {
    pub id: Uuid,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    pub company_description: Option<String>,
    pub company_website: Option<String>,
    pub company_address: Option<String>,
    pub company_registration_number: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    #[serde(skip_serializing)]
    pub activation_token: String,
    pub expires_at: DateTime<Utc>,
    pub metadata: RequestMetadata,
    pub provisioned_user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RegistrationRequest {
    /// New pending request with a fresh token and expiry.
    pub fn new(
        request_type: RequestType,
        applicant: Applicant,
        company: Option<CompanyDetails>,
        metadata: RequestMetadata,
        expiry_days: i64,
        now: DateTime<Utc>,
    ) -> Self {
        let company = company.unwrap_or_default();
        let non_empty = |s: String| if s.trim().is_empty() { None } else { Some(s) };

        Self {
            id: Uuid::new_v4(),
            request_type,
            status: RequestStatus::Pending,
            email: applicant.email.trim().to_lowercase(),
            username: applicant.username.trim().to_string(),
            first_name: applicant.first_name,
            last_name: applicant.last_name,
            phone: applicant.phone,
            company_name: non_empty(company.name),
            company_description: company.description,
            company_website: company.website,
            company_address: company.address,
            company_registration_number: company.registration_number,
            reviewed_by: None,
            reviewed_at: None,
            rejection_reason: None,
            activation_token: generate_token(),
            expires_at: now + Duration::days(expiry_days),
            metadata,
            provisioned_user_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_company(&self) -> bool {
        self.request_type == RequestType::CompanyRegistration
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    pub fn can_be_approved(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::UnderReview)
            && !self.is_expired(now)
    }

    fn ensure(&self, action: &str, allowed: &[RequestStatus]) -> AppResult<()> {
        if allowed.contains(&self.status) {
            Ok(())
        } else {
            Err(AppError::transition(action, self.status))
        }
    }

    fn record_review(&mut self, status: RequestStatus, reviewer: Uuid, now: DateTime<Utc>) {
        self.status = status;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.updated_at = now;
    }

    pub fn mark_under_review(&mut self, reviewer: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure("review", &[RequestStatus::Pending])?;
        self.record_review(RequestStatus::UnderReview, reviewer, now);
        Ok(())
    }

    pub fn require_documents(
        &mut self,
        reviewer: Uuid,
        message: Option<String>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        self.ensure(
            "request documents for",
            &[RequestStatus::Pending, RequestStatus::UnderReview],
        )?;
        self.record_review(RequestStatus::DocumentsRequired, reviewer, now);
        self.metadata.review_message = message;
        Ok(())
    }

    /// Approve the request.
    ///
    /// A request past its expiry moves to `expired` and the call fails; the
    /// caller is expected to persist that change.
    pub fn approve(&mut self, approver: Uuid, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure("approve", &[RequestStatus::Pending, RequestStatus::UnderReview])?;
        if self.is_expired(now) {
            self.status = RequestStatus::Expired;
            self.updated_at = now;
            return Err(AppError::RequestExpired);
        }
        self.record_review(RequestStatus::Approved, approver, now);
        Ok(())
    }

    pub fn reject(&mut self, reviewer: Uuid, reason: String, now: DateTime<Utc>) -> AppResult<()> {
        if reason.trim().is_empty() {
            return Err(AppError::validation("A rejection reason is required"));
        }
        self.ensure("reject", RequestStatus::OPEN)?;
        self.record_review(RequestStatus::Rejected, reviewer, now);
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// Applicant resubmits after providing the requested documents.
    pub fn resubmit(&mut self, now: DateTime<Utc>) -> AppResult<()> {
        self.ensure("resubmit", &[RequestStatus::DocumentsRequired])?;
        if self.is_expired(now) {
            return Err(AppError::RequestExpired);
        }
        self.status = RequestStatus::Pending;
        self.updated_at = now;
        Ok(())
    }

    /// Expire an open request past its deadline. Returns whether it changed.
    pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
        if self.status.is_open() && self.is_expired(now) {
            self.status = RequestStatus::Expired;
            self.updated_at = now;
            true
        } else {
            false
        }
    }

    /// Documents may only be attached while the request is open.
    pub fn accepts_documents(&self, now: DateTime<Utc>) -> bool {
        self.status.is_open() && !self.is_expired(now)
    }
}
