//! Outgoing email notifications.
//!
//! `messages` builds each email from domain data; [`Notifier`] hands them
//! to the configured [`Mailer`]. A failed delivery is logged and never
//! fails the operation that triggered it.

use futures::future::join_all;
use std::sync::Arc;

use crate::jobs::{EmailJob, Mailer};

/// Dispatches emails on behalf of services
#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    from: String,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, from: impl Into<String>) -> Self {
        Self {
            mailer,
            from: from.into(),
        }
    }

    pub async fn deliver(&self, email: EmailJob) {
        let to = email.to.clone();
        let subject = email.subject.clone();
        if let Err(e) = self.mailer.send(email.with_from(self.from.clone())).await {
            tracing::warn!(to = %to, subject = %subject, error = %e, "Failed to send email");
        }
    }

    /// Deliver independent emails concurrently
    pub async fn deliver_all(&self, emails: Vec<EmailJob>) {
        join_all(emails.into_iter().map(|email| self.deliver(email))).await;
    }
}

/// Message catalogue
pub mod messages {
    use crate::domain::{Notification, RegistrationRequest, User};
    use crate::jobs::EmailJob;

    fn greeting(request: &RegistrationRequest) -> String {
        format!("Dear {},", request.full_name())
    }

    fn subject_name(request: &RegistrationRequest) -> String {
        request
            .company_name
            .clone()
            .unwrap_or_else(|| request.full_name())
    }

    /// Confirmation sent to the applicant after submitting
    pub fn registration_received(request: &RegistrationRequest, status_link: &str) -> EmailJob {
        let body = format!(
            "{}\n\n\
             Thank you for registering with Construction Tracker. Your request \
             is now waiting for review by our team.\n\n\
             You can check its status and upload supporting documents here:\n{}\n\n\
             This link expires on {}.",
            greeting(request),
            status_link,
            request.expires_at.format("%Y-%m-%d"),
        );
        EmailJob::new(
            &request.email,
            "Registration received - Construction Tracker",
            body,
        )
    }

    /// Alert for a super owner who can activate accounts
    pub fn registration_alert(
        request: &RegistrationRequest,
        recipient: &str,
        review_link: &str,
    ) -> EmailJob {
        let body = format!(
            "A new {} request was submitted.\n\n\
             Applicant: {} <{}>\n\
             Username: {}\n\
             Company: {}\n\n\
             Review it here:\n{}",
            request.request_type,
            request.full_name(),
            request.email,
            request.username,
            request.company_name.as_deref().unwrap_or("-"),
            review_link,
        );
        EmailJob::new(
            recipient,
            format!("New registration request: {}", subject_name(request)),
            body,
        )
    }

    pub fn under_review(request: &RegistrationRequest) -> EmailJob {
        let body = format!(
            "{}\n\nYour registration request is now under review. We will \
             contact you once a decision has been made.",
            greeting(request),
        );
        EmailJob::new(&request.email, "Registration under review", body)
    }

    pub fn documents_required(
        request: &RegistrationRequest,
        message: Option<&str>,
        status_link: &str,
    ) -> EmailJob {
        let mut body = format!(
            "{}\n\nWe need additional documents to continue reviewing your \
             registration request.",
            greeting(request),
        );
        if let Some(message) = message.filter(|m| !m.trim().is_empty()) {
            body.push_str(&format!("\n\nReviewer notes:\n{}", message.trim()));
        }
        body.push_str(&format!(
            "\n\nUpload the documents and resubmit your request here:\n{}",
            status_link
        ));
        EmailJob::new(&request.email, "Documents required for your registration", body)
    }

    pub fn registration_rejected(request: &RegistrationRequest, reason: &str) -> EmailJob {
        let body = format!(
            "{}\n\nWe are sorry to inform you that your registration request \
             was not approved.\n\nReason: {}\n\nYou are welcome to submit a new \
             request.",
            greeting(request),
            reason,
        );
        EmailJob::new(&request.email, "Registration request declined", body)
    }

    /// Approval notice carrying the login credentials
    pub fn registration_approved(
        request: &RegistrationRequest,
        user: &User,
        temp_password: &str,
        login_link: &str,
    ) -> EmailJob {
        let mut body = format!(
            "{}\n\nYour registration has been approved.",
            greeting(request),
        );
        if let Some(company) = &request.company_name {
            body.push_str(&format!(
                " Your company \"{}\" is ready and you are its administrator.",
                company
            ));
        }
        body.push_str(&format!(
            "\n\nUsername: {}\nTemporary password: {}\n\n\
             Sign in here and change your password right away:\n{}",
            user.username, temp_password, login_link,
        ));
        EmailJob::new(&request.email, "Welcome to Construction Tracker", body)
    }

    /// Email copy of an in-app notification
    pub fn notification_copy(company_name: &str, notification: &Notification, to: &str) -> EmailJob {
        EmailJob::new(
            to,
            format!("[{}] {}", company_name, notification.title),
            format!(
                "{}\n\nSign in to Construction Tracker to see all your notifications.",
                notification.message
            ),
        )
    }

    /// Invitation into a company. New accounts also get their credentials.
    pub fn member_invited(
        user: &User,
        company_name: &str,
        temp_password: Option<&str>,
        login_link: &str,
    ) -> EmailJob {
        let mut body = format!(
            "Dear {},\n\nYou have been added to {} on Construction Tracker.",
            user.full_name(),
            company_name,
        );
        if let Some(password) = temp_password {
            body.push_str(&format!(
                "\n\nUsername: {}\nTemporary password: {}",
                user.username, password
            ));
        }
        body.push_str(&format!("\n\nSign in here:\n{}", login_link));
        EmailJob::new(&user.email, format!("You have joined {}", company_name), body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Applicant, CompanyDetails, NewUser, RegistrationRequest, RequestMetadata, RequestType,
    };
    use crate::errors::AppError;
    use crate::jobs::MockMailer;
    use chrono::Utc;

    fn request() -> RegistrationRequest {
        RegistrationRequest::new(
            RequestType::CompanyRegistration,
            Applicant {
                email: "ada@acme.test".to_string(),
                username: "ada".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Obi".to_string(),
                phone: None,
            },
            Some(CompanyDetails {
                name: "Acme Builders".to_string(),
                ..Default::default()
            }),
            RequestMetadata::default(),
            30,
            Utc::now(),
        )
    }

    #[test]
    fn test_approval_message_carries_credentials() {
        let request = request();
        let user = NewUser {
            username: "ada".to_string(),
            email: "ada@acme.test".to_string(),
            password_hash: String::new(),
            first_name: "Ada".to_string(),
            last_name: "Obi".to_string(),
            is_active: true,
            is_staff: false,
        }
        .into_user();

        let email = messages::registration_approved(&request, &user, "Tmp12345abcd", "http://x/login");
        assert_eq!(email.to, "ada@acme.test");
        assert!(email.body.contains("Tmp12345abcd"));
        assert!(email.body.contains("Acme Builders"));
    }

    #[test]
    fn test_documents_required_includes_notes() {
        let email = messages::documents_required(&request(), Some("Send your CAC"), "http://x/s");
        assert!(email.body.contains("Send your CAC"));
        assert!(email.body.contains("http://x/s"));

        let email = messages::documents_required(&request(), Some("  "), "http://x/s");
        assert!(!email.body.contains("Reviewer notes"));
    }

    #[tokio::test]
    async fn test_delivery_failure_is_swallowed() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|email| email.from.as_deref() == Some("noreply@test"))
            .times(1)
            .returning(|_| Err(AppError::internal("queue down")));

        let notifier = Notifier::new(Arc::new(mailer), "noreply@test");
        notifier
            .deliver(messages::under_review(&request()))
            .await;
    }
}
